use confkit::prelude::*;
use confkit::Map;
use confkit_logger::LEVELS;

/// Parameters of the sample service the CLI resolves.
///
/// `port` is lockable: with `--lock-after-load` it cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Parameters)]
pub struct ServiceParams {
    #[param(default = "127.0.0.1", not_nil, make_string, not_empty)]
    pub address: String,
    #[param(default = 8080, make_int, within = 1..=65535, lockable)]
    pub port: u16,
    #[param(default = "info", make_string, one_of = LEVELS)]
    pub log_level: String,
    #[param(default = false, make_flag)]
    pub tls: bool,
    #[param(default = 30.0, make_float, min = 0.0)]
    pub timeout: f64,
    #[param(default_with = Vec::<String>::new, make_array)]
    pub allowed_origins: Vec<String>,
    #[param(default_with = Map::new, make_hash)]
    pub labels: Map,
}
