//! Courier configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use courier_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[api]\nport = 8080").unwrap();
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [storage]
//! backend = "sqlite"
//! path = "data/courier.db"
//!
//! [api]
//! port = 8080
//! broker_publish_addr = "127.0.0.1:7401"
//!
//! [broker]
//! pull_port = 7401
//! sub_port = 7402
//!
//! [edge]
//! port = 9001
//! broker_sub_addr = "127.0.0.1:7402"
//! ```

mod api;
mod broker;
mod edge;
mod error;
mod logging;
mod storage;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use api::ApiConfig;
pub use broker::BrokerConfig;
pub use edge::EdgeConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use storage::{StorageBackend, StorageConfig};

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Storage backend configuration
    pub storage: StorageConfig,

    /// HTTP API server configuration
    pub api: ApiConfig,

    /// Broker forwarder configuration
    pub broker: BrokerConfig,

    /// Edge node configuration
    pub edge: EdgeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
