//! # CLI Argument Definitions
//!
//! Command-line interface of the `confkit` binary, declared with `clap` derive.

use clap::{Parser, ValueEnum};
use confkit::Value;
use std::path::PathBuf;

/// Loads configuration sources for the sample service and prints the effective values.
#[derive(Debug, Parser)]
#[command(name = "confkit")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve and validate service configuration")]
pub struct Cli {
    /// Configuration files (YAML, JSON or TOML), applied in order
    #[arg(value_name = "SOURCES")]
    pub sources: Vec<PathBuf>,

    /// Override a parameter; the value uses YAML scalar syntax (e.g. `port=9000`, `tls=yes`)
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, Value)>,

    /// Prefix of environment overrides (`<PREFIX>__PORT=9000`)
    #[arg(long, default_value = "CONFKIT")]
    pub env_prefix: String,

    /// Lock lockable parameters once every source has been applied
    #[arg(long)]
    pub lock_after_load: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Minimum log level written to stderr
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Also write rolling log files into this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `name = value` line per parameter
    Text,
    /// A single JSON object
    Json,
}

/// Parses a `key=value` override.
///
/// # Errors
/// Returns a message when `=` is missing, the key is blank or the value is not valid YAML.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    if value.trim().is_empty() {
        return Ok((key.to_owned(), Value::Str(String::new())));
    }
    let value =
        serde_yaml::from_str(value).map_err(|err| format!("invalid value for '{key}': {err}"))?;
    Ok((key.to_owned(), value))
}
