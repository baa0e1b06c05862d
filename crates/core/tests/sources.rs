use confkit_core::*;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Serves documents from memory and records what was requested.
#[derive(Debug, Default)]
struct MemoryLoader {
    files: HashMap<PathBuf, Value>,
    requests: Mutex<Vec<String>>,
}

impl MemoryLoader {
    fn with(mut self, path: &str, document: Value) -> Self {
        self.files.insert(PathBuf::from(path), document);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load_path(&self, path: &Path) -> Result<Value, ConfigError> {
        self.requests.lock().unwrap().push(path.display().to_string());
        self.files.get(path).cloned().ok_or_else(|| {
            ConfigError::decode(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
        })
    }

    fn load_reader(
        &self,
        reader: &mut dyn Read,
        format: Option<Format>,
    ) -> Result<Value, ConfigError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(ConfigError::decode)?;
        self.requests.lock().unwrap().push(format!("{}:{text}", format.unwrap_or_default()));
        let (key, value) = text.split_once('=').ok_or("malformed line")?;
        Ok(Value::from_iter([(key.trim(), value.trim())]))
    }
}

fn registry() -> Arc<ParameterRegistry> {
    ParameterRegistry::builder()
        .param("host", Constraints::new().not_empty())
        .param("port", Constraints::new().make_int().lockable())
        .build()
}

#[test]
fn test_paths_are_delegated_to_the_loader() {
    let loader = Arc::new(
        MemoryLoader::default()
            .with("base.yml", Value::from_iter([("host", Value::from("base")), ("port", 1.into())]))
            .with("override.yml", Value::from_iter([("port", "2")])),
    );
    let mut config =
        Configuration::builder().registry(registry()).shared_loader(loader.clone()).build();

    config
        .configure(Value::from_iter([(
            OPTIONS_SOURCE,
            Value::from(vec!["base.yml", "override.yml"]),
        )]))
        .unwrap();

    assert_eq!(config.get("host").unwrap(), &Value::from("base"));
    assert_eq!(config.get("port").unwrap(), &Value::Int(2));
    assert_eq!(*loader.requests.lock().unwrap(), ["base.yml", "override.yml"]);
}

#[test]
fn test_decode_failures_carry_context() {
    let mut config =
        Configuration::builder().registry(registry()).loader(MemoryLoader::default()).build();

    let err = config.configure(Source::path("missing.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::SourceDecode { .. }));
    assert!(err.to_string().contains("(Loading missing.yml)"), "{err}");
}

#[test]
fn test_readers_pass_their_format() {
    let loader = Arc::new(MemoryLoader::default());
    let mut config = Configuration::new(registry());
    config.set_loader(loader.clone());

    config.configure(Source::reader("host = stream".as_bytes(), Some(Format::Toml))).unwrap();
    config.configure(Source::reader("port = 9".as_bytes(), None)).unwrap();

    assert_eq!(config.get("host").unwrap(), &Value::from("stream"));
    assert_eq!(config.get("port").unwrap(), &Value::Int(9));
    assert_eq!(*loader.requests.lock().unwrap(), ["toml:host = stream", "yaml:port = 9"]);
}

#[test]
fn test_loaded_documents_still_respect_locks() {
    let loader = MemoryLoader::default().with("port.yml", Value::from_iter([("port", 5)]));
    let mut config = Configuration::builder().registry(registry()).loader(loader).build();
    config.lock();

    let err = config.configure(PathBuf::from("port.yml")).unwrap_err();
    assert_eq!(err.kind(), "Locked");
}

#[test]
fn test_self_including_files_are_rejected() {
    let loader = MemoryLoader::default()
        .with("a.yml", Value::from_iter([(OPTIONS_SOURCE, "a.yml")]));
    let mut config = Configuration::builder().registry(registry()).loader(loader).build();

    let err = config.configure(Source::path("a.yml")).unwrap_err();
    assert_eq!(err.kind(), "SourceCycle");
    assert!(err.to_string().contains("a.yml -> a.yml"), "{err}");
}

#[test]
fn test_mutually_including_files_are_rejected() {
    let loader = MemoryLoader::default()
        .with(
            "a.yml",
            Value::from_iter([("host", Value::from("a")), (OPTIONS_SOURCE, Value::from("b.yml"))]),
        )
        .with("b.yml", Value::from_iter([(OPTIONS_SOURCE, Value::from(vec!["a.yml"]))]));
    let mut config = Configuration::builder().registry(registry()).loader(loader).build();

    let err = config.configure(Value::from_iter([(OPTIONS_SOURCE, "a.yml")])).unwrap_err();
    assert!(
        matches!(&err, ConfigError::SourceCycle { path, .. } if path == Path::new("a.yml")),
        "{err}"
    );
    assert!(err.to_string().contains("a.yml -> b.yml -> a.yml"), "{err}");
    // Entries before the cycle stay applied.
    assert_eq!(config.get("host").unwrap(), &Value::from("a"));
}

#[test]
fn test_shared_includes_are_not_cycles() {
    let loader = MemoryLoader::default()
        .with("base.yml", Value::from_iter([("port", 1)]))
        .with("one.yml", Value::from_iter([(OPTIONS_SOURCE, "base.yml")]))
        .with("two.yml", Value::from_iter([(OPTIONS_SOURCE, "base.yml")]));
    let mut config = Configuration::builder().registry(registry()).loader(loader).build();

    config.configure(Value::from(vec!["one.yml", "two.yml"])).unwrap();
    assert_eq!(config.get("port").unwrap(), &Value::Int(1));

    // The same file may be applied again by a later call.
    config.configure(Source::path("base.yml")).unwrap();
}

#[test]
fn test_nesting_depth_is_bounded() {
    let mut loader = MemoryLoader::default();
    for i in 0..=MAX_NESTED_FILES {
        let next = format!("{}.yml", i + 1);
        loader = loader.with(&format!("{i}.yml"), Value::from_iter([(OPTIONS_SOURCE, next)]));
    }
    let mut config = Configuration::builder().registry(registry()).loader(loader).build();

    let err = config.configure(Source::path("0.yml")).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedSource");
    assert!(err.to_string().contains(&format!("{MAX_NESTED_FILES}.yml")), "{err}");
}
