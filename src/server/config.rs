//! Configuration loading for hcached.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.hcache/config.toml` (user)
//! 3. `/etc/hcache/config.toml` (system)
//!
//! Without an explicit path and without any of the files above, built-in
//! defaults are used.

use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CacheConfig, CacheError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheSection,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:6001).
    #[serde(default = "default_address")]
    pub address: String,
    /// Prometheus `/metrics` listen address (default: 127.0.0.1:6002).
    /// Empty disables the exporter.
    #[serde(default = "default_metrics_address")]
    pub metrics_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            metrics_address: default_metrics_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:6001".to_string()
}

fn default_metrics_address() -> String {
    "127.0.0.1:6002".to_string()
}

/// Cache behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Evict entries not requested for this many seconds; 0 disables
    /// eviction (default: 7200).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Upper bound for one upstream fetch in seconds (default: 30).
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    7200
}

fn default_fetch_timeout() -> u64 {
    30
}

impl From<&CacheSection> for CacheConfig {
    fn from(section: &CacheSection) -> Self {
        CacheConfig::new()
            .idle_timeout(Duration::from_secs(section.idle_timeout_secs))
            .fetch_timeout(Duration::from_secs(section.fetch_timeout_secs))
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.hcache/config.toml`
    /// 3. `/etc/hcache/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CacheError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CacheError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, `None` if no file applies.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(CacheError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hcache").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/hcache/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Parsed RPC listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        parse_addr("address", &self.server.address)
    }

    /// Parsed metrics listen address, `None` when the exporter is disabled.
    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>> {
        if self.server.metrics_address.is_empty() {
            return Ok(None);
        }
        parse_addr("metrics_address", &self.server.metrics_address).map(Some)
    }

    /// Library-level cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::from(&self.cache)
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| CacheError::Configuration(format!("Invalid {field} {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:6001");
        assert_eq!(config.server.metrics_address, "127.0.0.1:6002");
        assert_eq!(config.cache.idle_timeout_secs, 7200);
        assert_eq!(config.cache.fetch_timeout_secs, 30);
    }

    #[test]
    fn metrics_address_is_configurable() {
        let toml = r#"
            [server]
            metrics_address = "0.0.0.0:9102"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.metrics_address, "0.0.0.0:9102");
        assert_eq!(config.server.address, "127.0.0.1:6001");

        assert_eq!(
            config.metrics_addr().unwrap(),
            Some("0.0.0.0:9102".parse().unwrap())
        );

        let config: Config = toml::from_str("[server]\nmetrics_address = \"\"\n").unwrap();
        assert_eq!(config.metrics_addr().unwrap(), None);
    }

    #[test]
    fn invalid_addresses_are_configuration_errors() {
        let mut config = Config::default();
        config.server.metrics_address = "localhost".into();
        let err = config.metrics_addr().unwrap_err();
        assert!(matches!(err, CacheError::Configuration(ref m) if m.contains("metrics_address")));

        config.server.address = "nowhere".into();
        assert!(config.listen_addr().is_err());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:6001"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:6001");
        // Defaults preserved
        assert_eq!(config.server.metrics_address, "127.0.0.1:6002");
        assert_eq!(config.cache.idle_timeout_secs, 7200);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "127.0.0.1:7001"

            [cache]
            idle_timeout_secs = 0
            fetch_timeout_secs = 5
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let cache = config.cache_config();
        assert_eq!(cache.idle_timeout, Duration::ZERO);
        assert_eq!(cache.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let toml = r#"
            [cache]
            idle_timeout_secs = "two hours"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nidle_timeout_secs = 60\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache.idle_timeout_secs, 60);
        assert_eq!(config.server.address, "127.0.0.1:6001");
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
    }
}
