//! # confkit CLI
//!
//! Resolves the configuration of a sample service from files, environment variables and
//! command-line overrides, validates it, and prints the effective values.
//!
//! Sources are applied in this order, later ones winning:
//! 1. parameter defaults
//! 2. `SOURCES` files, in the order given
//! 3. environment variables named `<PREFIX>__<PARAMETER>`
//! 4. `--set key=value` overrides
//!
//! ## Example
//! ```no_run
//! use clap::Parser;
//! use confkit_cli::{Cli, render, resolve};
//!
//! let cli = Cli::parse_from(["confkit", "service.yml", "--set", "port=9000"]);
//! let configuration = resolve(&cli)?;
//! println!("{}", render(&configuration, cli.format)?);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod args;
mod service;

pub use args::{Cli, OutputFormat, parse_assignment};
pub use service::ServiceParams;

use anyhow::{Context, Result};
use confkit::prelude::*;
use std::fmt::Write as _;
use tracing::{debug, info};

/// Applies every source named by `cli` to a fresh service configuration.
///
/// # Errors
/// Returns the first source that cannot be read or holds a rejected value, with the source
/// named in the error context.
pub fn resolve(cli: &Cli) -> Result<Configuration> {
    resolve_with_env(cli, confkit::env_source(&cli.env_prefix))
}

/// Same as [`resolve`], with the environment overrides given explicitly.
///
/// # Errors
/// See [`resolve`].
pub fn resolve_with_env(cli: &Cli, env: Value) -> Result<Configuration> {
    let mut configuration = confkit::configuration_for::<ServiceParams>();

    for path in &cli.sources {
        configuration
            .configure(path.as_path())
            .with_context(|| format!("Failed to apply {}", path.display()))?;
        debug!(path = %path.display(), "Applied configuration file");
    }

    configuration
        .configure(env)
        .with_context(|| format!("Failed to apply {}__* environment overrides", cli.env_prefix))?;

    for (key, value) in &cli.set {
        configuration
            .set(key, value.clone())
            .with_context(|| format!("Failed to apply --set {key}"))?;
    }

    // Extraction doubles as a check that every value has the declared field type.
    ServiceParams::extract(&configuration).context("Resolved configuration is inconsistent")?;

    if cli.lock_after_load {
        configuration.lock();
        info!("Configuration locked");
    }

    Ok(configuration)
}

/// Formats the effective values of `configuration`.
///
/// # Errors
/// Returns an error if a value cannot be serialized.
pub fn render(configuration: &Configuration, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&configuration.to_value())
                .context("Failed to encode JSON")?;
            out.push('\n');
            Ok(out)
        },
        OutputFormat::Text => {
            let mut out = String::new();
            if configuration.locked() {
                out.push_str("# locked\n");
            }
            for (name, value) in configuration.values() {
                let value = serde_json::to_string(value).context("Failed to encode value")?;
                writeln!(out, "{name} = {value}")?;
            }
            Ok(out)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use confkit::Map;

    fn empty() -> Value {
        Value::Map(Map::new())
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("confkit").chain(args.iter().copied()))
    }

    #[test]
    fn overrides_win_over_the_environment() {
        let env = confkit::loader::env_source_from(
            "CONFKIT",
            [("CONFKIT__PORT", "9000"), ("CONFKIT__TLS", "yes")],
        );
        let configuration = resolve_with_env(&cli(&["--set", "port=9100"]), env).unwrap();
        let params = ServiceParams::extract(&configuration).unwrap();
        assert_eq!(params.port, 9100);
        assert!(params.tls);
    }

    #[test]
    fn rejected_overrides_name_the_flag() {
        let err = resolve_with_env(&cli(&["--set", "port=0"]), empty()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to apply --set port");
        let cause = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(cause.kind(), "Range");
    }

    #[test]
    fn unknown_environment_keys_are_rejected() {
        let env = confkit::loader::env_source_from("APP", [("APP__COLOR", "blue")]);
        let err = resolve_with_env(&cli(&["--env-prefix", "APP"]), env).unwrap_err();
        assert!(err.to_string().contains("APP__*"));
        assert_eq!(err.downcast_ref::<ConfigError>().unwrap().kind(), "UnknownParameter");
    }

    #[test]
    fn lock_after_load_locks_lockable_parameters() {
        let mut configuration = resolve_with_env(&cli(&["--lock-after-load"]), empty()).unwrap();
        assert!(configuration.locked());
        assert_eq!(configuration.set("port", 1).unwrap_err().kind(), "Locked");
        configuration.set("tls", true).unwrap();
    }

    #[test]
    fn text_output_lists_every_parameter_in_declaration_order() {
        let configuration = resolve_with_env(&cli(&[]), empty()).unwrap();
        let text = render(&configuration, OutputFormat::Text).unwrap();
        let names: Vec<&str> =
            text.lines().filter_map(|line| line.split_once(" = ")).map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["address", "port", "log_level", "tls", "timeout", "allowed_origins", "labels"]
        );
        assert!(text.contains("address = \"127.0.0.1\"\n"));
        assert!(text.contains("allowed_origins = []\n"));
    }

    #[test]
    fn json_output_is_a_single_object() {
        let configuration = resolve_with_env(&cli(&["-s", "port=81"]), empty()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render(&configuration, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["port"], 81);
        assert_eq!(json["labels"], serde_json::json!({}));
    }
}
