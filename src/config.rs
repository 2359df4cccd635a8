use std::env;
use std::time::Duration;

use tracing::warn;

use crate::domain::{parse_port_ranges, ConfigError, PortRange};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub scrape_interval: Duration,
    /// Fixed subscription IDs; empty means auto-discover via the API
    pub subscriptions: Vec<String>,
    pub locations: Vec<String>,
    pub portscan: bool,
    pub portscan_interval: Duration,
    pub portscan_parallel: usize,
    pub portscan_threads: usize,
    pub portscan_timeout: Duration,
    pub portscan_ranges: Vec<PortRange>,
    pub log_level: String,
}

impl Config {
    /// Load from the environment. Port ranges are validated here so a bad
    /// range aborts startup before any scheduling begins.
    pub fn from_env() -> Result<Self, ConfigError> {
        let range_entries = env_list("AZRM_PORTSCAN_RANGE", &["1-65535"]);
        let portscan_ranges = parse_port_ranges(&range_entries)?;

        Ok(Self {
            bind: env::var("AZRM_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            scrape_interval: Duration::from_secs(env_parse("AZRM_SCRAPE_INTERVAL", 120)),
            subscriptions: env_list("AZRM_SUBSCRIPTIONS", &[]),
            locations: env_list("AZRM_LOCATIONS", &["westeurope", "northeurope"]),
            portscan: env::var("AZRM_PORTSCAN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            portscan_interval: Duration::from_secs(env_parse("AZRM_PORTSCAN_INTERVAL", 1800)),
            portscan_parallel: env_parse("AZRM_PORTSCAN_PARALLEL", 2),
            portscan_threads: env_parse("AZRM_PORTSCAN_THREADS", 1000),
            portscan_timeout: Duration::from_secs(env_parse("AZRM_PORTSCAN_TIMEOUT", 5)),
            portscan_ranges,
            log_level: env::var("AZRM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Numeric variable, falling back to `default` when unset. A set but
/// unparsable value is logged and ignored rather than aborting startup.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring {key}={value}: not a valid value, using the default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Space-delimited list variable, falling back to `default` when unset
fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(value) => value
            .split_whitespace()
            .map(|s| s.to_string())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}
