use confkit::prelude::*;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, PartialEq, Parameters)]
struct Server {
    #[param(name = "bind", default = "127.0.0.1", not_empty)]
    address: String,
    #[param(default = 8080, make_int, within = 1..=65535, lockable)]
    port: u16,
    #[param(default = false, make_bool)]
    tls: bool,
    #[param(make_float, min = 0.0)]
    timeout: Option<f64>,
    #[param(default_with = confkit::Map::new, make_hash)]
    labels: confkit::Map,
    #[param(convert_with = |v: Value| Value::from(v.to_string().to_lowercase()))]
    r#mode: Option<String>,
}

#[derive(Debug)]
struct App {
    config: Configuration,
    reloads: usize,
}

impl Configurable for App {
    fn configuration(&self) -> &Configuration {
        &self.config
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

#[test]
fn test_defaults_extract_into_the_struct() {
    let server: Server = confkit::load(confkit::Map::new()).unwrap();
    assert_eq!(server.address, "127.0.0.1");
    assert_eq!(server.port, 8080);
    assert!(!server.tls);
    assert_eq!(server.timeout, None);
    assert!(server.labels.is_empty());
}

#[test]
fn test_renamed_and_raw_fields() {
    let registry = Server::registry();
    let names: Vec<&str> = registry.param_names().collect();
    assert_eq!(names, ["bind", "port", "tls", "timeout", "labels", "mode"]);

    let server: Server = confkit::load(Value::from_iter([
        ("bind", Value::from("0.0.0.0")),
        ("mode", Value::from("STRICT")),
        ("labels", Value::Seq(Vec::new())),
    ]))
    .unwrap();
    assert_eq!(server.address, "0.0.0.0");
    assert_eq!(server.r#mode.as_deref(), Some("strict"));
    assert!(server.labels.is_empty());
}

#[test]
fn test_extraction_reports_the_field() {
    let mut config = Server::configuration();
    config.set("timeout", "1.5").unwrap();
    assert_eq!(Server::extract(&config).unwrap().timeout, Some(1.5));

    // `labels` holds a mapping; a typed read of the wrong shape fails.
    let err = config.get_as::<Vec<String>>("labels").unwrap_err();
    assert_eq!(err.kind(), "Extract");
    assert_eq!(err.parameter(), Some("labels"));
}

#[test]
fn test_files_and_environment_layer_over_defaults() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("server.toml");
    fs::write(&base, "port = 9000\ntls = \"yes\"\n[labels]\nteam = \"core\"\n").unwrap();

    let env = confkit::loader::env_source_from("srv", [("SRV__PORT", "9443")]);
    let server: Server = confkit::load(vec![Source::path(&base), Source::from(env)]).unwrap();

    assert_eq!(server.port, 9443);
    assert!(server.tls);
    assert_eq!(server.labels.get("team"), Some(&Value::from("core")));
}

#[test]
fn test_configurable_owner_reacts_after_configuration() {
    let mut app = App { config: confkit::configuration_for::<Server>(), reloads: 0 };
    app.configure_then(Value::from_iter([("port", 81)]), |app| app.reloads += 1)
        .unwrap()
        .lock();

    assert_eq!(app.reloads, 1);
    let server = Server::extract(app.configuration()).unwrap();
    assert_eq!(server.port, 81);

    let err = app.configure(Value::from_iter([("port", 82)])).unwrap_err();
    assert_eq!(err.kind(), "Locked");
    assert_eq!(app.reloads, 1);
}
