use confkit_core::{Map, Value};
use tracing::trace;

/// Separates the prefix from the parameter name: `CONFKIT__PORT=8080` sets `port`.
pub const ENV_SEPARATOR: &str = "__";

/// Collects `PREFIX__NAME=value` process environment variables into a mapping.
///
/// See [`env_source_from`].
#[must_use]
pub fn env_source(prefix: &str) -> Value {
    env_source_from(prefix, std::env::vars())
}

/// Collects `PREFIX__NAME=value` pairs into a mapping keyed by the lowercase `NAME`.
///
/// The prefix match is case-insensitive. Values stay strings; `make_*` constraints type them.
/// Entries are sorted by key so repeated runs apply overrides in the same order.
pub fn env_source_from<I, K, V>(prefix: &str, vars: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let head = format!("{}{ENV_SEPARATOR}", prefix.to_ascii_uppercase());
    let mut entries: Vec<(String, Value)> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.as_ref();
            let name = key.get(..head.len()).filter(|h| h.eq_ignore_ascii_case(&head))?;
            let name = &key[name.len()..];
            (!name.is_empty()).then(|| (name.to_ascii_lowercase(), Value::Str(value.into())))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    trace!(prefix, count = entries.len(), "Collected environment overrides");
    Value::Map(entries.into_iter().collect::<Map>())
}
