//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use order_store::IsolationLevel;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL connection string; the in-memory store is
///   used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `PAGE_LIMIT`: default page size for listings (default: `10`)
/// - `FULFILLMENT_TIMEOUT_MS`: upper bound for one order (default: `5000`)
/// - `ISOLATION_LEVEL`: `read_committed`, `repeatable_read` or
///   `serializable` (default: `read_committed`)
///
/// Unparsable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub page_limit: i64,
    pub fulfillment_timeout: Duration,
    pub isolation_level: IsolationLevel,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through the given variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(lookup("PORT"), defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_or(lookup("LOG_FORMAT"), defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(
                lookup("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            ),
            page_limit: parse_or(lookup("PAGE_LIMIT"), defaults.page_limit)
                .clamp(1, MAX_PAGE_LIMIT),
            fulfillment_timeout: lookup("FULFILLMENT_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.fulfillment_timeout),
            isolation_level: parse_or(lookup("ISOLATION_LEVEL"), defaults.isolation_level),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            page_limit: DEFAULT_PAGE_LIMIT,
            fulfillment_timeout: fulfillment::DEFAULT_TIMEOUT,
            isolation_level: IsolationLevel::ReadCommitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.fulfillment_timeout, Duration::from_secs(5));
        assert_eq!(config.isolation_level, IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_reads_variables() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/inventory"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("PAGE_LIMIT", "20"),
            ("FULFILLMENT_TIMEOUT_MS", "250"),
            ("ISOLATION_LEVEL", "serializable"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/inventory")
        );
        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.page_limit, 20);
        assert_eq!(config.fulfillment_timeout, Duration::from_millis(250));
        assert_eq!(config.isolation_level, IsolationLevel::Serializable);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("FULFILLMENT_TIMEOUT_MS", "-1"),
            ("ISOLATION_LEVEL", "chaos"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.fulfillment_timeout, Duration::from_secs(5));
        assert_eq!(config.isolation_level, IsolationLevel::ReadCommitted);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(config_from(&[("PAGE_LIMIT", "0")]).page_limit, 1);
        assert_eq!(config_from(&[("PAGE_LIMIT", "500")]).page_limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
