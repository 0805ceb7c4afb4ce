//! HTTP API server configuration

use serde::Deserialize;

/// API server configuration
///
/// # Example
///
/// ```toml
/// [api]
/// bind = "0.0.0.0"
/// port = 8080
/// broker_publish_addr = "127.0.0.1:7401"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener to
    /// Default: 127.0.0.1
    pub bind: String,

    /// Port to listen on
    /// Default: 8080
    pub port: u16,

    /// Address of the broker's publish (pull) side
    /// Default: 127.0.0.1:7401
    pub broker_publish_addr: String,
}

impl ApiConfig {
    /// Socket address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            broker_publish_addr: "127.0.0.1:7401".to_string(),
        }
    }
}
