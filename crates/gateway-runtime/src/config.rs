//! Runtime configuration.
//!
//! Loading order: defaults, then the JSON file named by `GATEWAY_CONFIG`,
//! then environment overrides. The node URL is mandatory.

use rest_gateway::domain::config::humantime_serde;
use rest_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Names of the environment variables read at startup.
pub mod env {
    pub const CONFIG_FILE: &str = "GATEWAY_CONFIG";
    pub const SQL_URI: &str = "SQL_URI";
    pub const NODE_HOST: &str = "KASPAD_HOST_1";
    pub const HOST: &str = "GATEWAY_HOST";
    pub const PORT: &str = "GATEWAY_PORT";
    pub const PRICE_USD: &str = "KAS_PRICE_USD";
    pub const DEBUG: &str = "DEBUG";
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("Please set the {} environment variable", env::NODE_HOST)]
    MissingNodeUrl,
    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
    #[error("cannot read config file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Complete configuration of the gateway process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub node: NodeConfig,
    pub market: MarketConfig,
    /// Verbose logging.
    #[serde(skip)]
    pub debug: bool,
}

/// Index database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Database endpoints are disabled without it.
    pub url: Option<String>,
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Node RPC bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Base URL of the node bridge; empty until configured.
    pub url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Coin price in USD used for market cap figures.
    pub price_usd: f64,
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, RuntimeConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load with `lookup` standing in for the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(env::CONFIG_FILE) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;

        if config.node.url.is_empty() {
            return Err(RuntimeConfigError::MissingNodeUrl);
        }
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, RuntimeConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| RuntimeConfigError::File {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| RuntimeConfigError::Parse { path, source })
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), RuntimeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::SQL_URI).filter(|u| !u.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(host) = lookup(env::NODE_HOST).filter(|h| !h.is_empty()) {
            self.node.url = node_url(&host);
        }
        if let Some(host) = lookup(env::HOST) {
            self.gateway.http.host = parse_env(env::HOST, host)?;
        }
        if let Some(port) = lookup(env::PORT) {
            self.gateway.http.port = parse_env(env::PORT, port)?;
        }
        if let Some(price) = lookup(env::PRICE_USD) {
            self.market.price_usd = parse_env(env::PRICE_USD, price)?;
        }
        // Any non-empty value turns debug logging on.
        self.debug = lookup(env::DEBUG).is_some_and(|v| !v.is_empty());
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    value: String,
) -> Result<T, RuntimeConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeConfigError::InvalidEnv { name, value })
}

/// `host:port` becomes `http://host:port`; full URLs are kept.
fn node_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
