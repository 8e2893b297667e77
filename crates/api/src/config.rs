//! Service configuration
//!
//! Defaults, then an optional config file, then `WEATHER_*` environment
//! variables.

use std::net::SocketAddr;
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use weather_store::StoreOptions;

/// Config file looked up when `WEATHER_CONFIG` is unset (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "config/weather-api";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WEATHER";

/// API server configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address
    pub listen_addr: String,
    /// Location of the SQLite store
    pub database_url: String,
    /// Pool size
    pub max_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Reject path dates that are not `YYYY-MM-DD` with 400 instead of
    /// comparing them as text
    pub strict_dates: bool,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_url: "sqlite://Resources/hawaii.sqlite".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            strict_dates: false,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Load from the file named by `WEATHER_CONFIG` (or the default path)
    /// and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (missing file allowed) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::load_layers(path, None)
    }

    /// Load from `path` with `env` standing in for the process environment.
    /// `None` reads the real environment.
    pub fn load_layers(path: &str, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| {
            ConfigError::Message(format!("invalid listen_addr {:?}: {}", self.listen_addr, e))
        })
    }

    /// Read-only store options derived from this config
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            url: self.database_url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            ..StoreOptions::default()
        }
    }
}
