//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Request validation limits
    pub limits: LimitsConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Caching hints sent to clients
    pub cache: CacheConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_upload_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_upload_size cannot be 0".into(),
            ));
        }

        if self.limits.max_batch_addresses == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_batch_addresses cannot be 0".into(),
            ));
        }

        if self.timeouts.default.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default timeout cannot be 0".into(),
            ));
        }

        if self.timeouts.hydration < self.timeouts.default {
            return Err(ConfigError::InvalidTimeout(
                "hydration timeout cannot be shorter than the default timeout".into(),
            ));
        }

        if self.cors.allow_credentials && self.cors.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "allow_credentials requires at least one allowed origin".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes
    pub max_upload_size: usize,
    /// Responses smaller than this are sent uncompressed
    pub gzip_min_size: u16,
    /// Max addresses in one batch request.
    ///
    /// The default sits above what `max_upload_size` can carry (an entry is
    /// at least `"a:b",`, six bytes), so out of the box only the body size
    /// bounds a batch.
    pub max_batch_addresses: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 200_000,
            gzip_min_size: 500,
            max_batch_addresses: 40_000,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default timeout for most requests
    #[serde(with = "humantime_serde")]
    pub default: Duration,
    /// Timeout for requests returning hydrated transactions
    #[serde(with = "humantime_serde")]
    pub hydration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(10),
            hydration: Duration::from_secs(60),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Response headers readable by browser clients
    pub expose_headers: Vec<String>,
    /// Max age for preflight cache, in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
            expose_headers: vec![
                "X-Current-Page".to_string(),
                "X-Oldest-Epoch-Millis".to_string(),
            ],
            max_age: 86400,
        }
    }
}

/// Cache-Control hints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Max age for a missing address name
    pub name_not_found_max_age: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name_not_found_max_age: 600,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration (de)serialization as `"10s"`, `"250ms"` or `"2m"`.
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse a duration string. A bare number means seconds.
    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.limits.max_upload_size, 200_000);
        assert_eq!(config.limits.gzip_min_size, 500);
    }

    #[test]
    fn test_default_batch_cap_not_tighter_than_body_limit() {
        let limits = LimitsConfig::default();
        let smallest_entry = "\"a:b\",".len();
        assert!(limits.max_batch_addresses * smallest_entry >= limits.max_upload_size);
    }

    #[test]
    fn test_config_address() {
        let config = GatewayConfig::default();
        assert_eq!(config.http_addr().port(), 8000);
    }

    #[test]
    fn test_zero_upload_size_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.max_upload_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_hydration_timeout_not_shorter_than_default() {
        let mut config = GatewayConfig::default();
        config.timeouts.hydration = Duration::from_secs(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"http":{"port":9000},"timeouts":{"hydration":"2m"}}"#)
                .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.timeouts.default, Duration::from_secs(10));
        assert_eq!(config.timeouts.hydration, Duration::from_secs(120));
        assert!(config.cors.allow_credentials);
    }

    #[test]
    fn test_parse_duration_units() {
        use humantime_serde::parse_duration;
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("15s"), Ok(Duration::from_secs(15)));
        assert_eq!(parse_duration("3m"), Ok(Duration::from_secs(180)));
        assert_eq!(parse_duration("7"), Ok(Duration::from_secs(7)));
        assert!(parse_duration("soon").is_err());
    }
}
