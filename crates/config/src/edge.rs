//! Edge node configuration

use std::time::Duration;

use serde::Deserialize;

/// Edge node configuration
///
/// # Example
///
/// ```toml
/// [edge]
/// bind = "0.0.0.0"
/// port = 9001
/// advertised_addr = "ws://push-1.example.com:9001/"
/// broker_sub_addr = "127.0.0.1:7402"
/// load_report_interval = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Address to bind the WebSocket listener to
    /// Default: 127.0.0.1
    pub bind: String,

    /// Port to listen on
    /// Default: 9001
    pub port: u16,

    /// Address advertised to clients via the node registry
    ///
    /// Defaults to `ws://{bind}:{port}/` when unset; set this when the node
    /// sits behind NAT or a hostname differs from the bind address.
    pub advertised_addr: Option<String>,

    /// Address of the broker's subscribe side
    /// Default: 127.0.0.1:7402
    pub broker_sub_addr: String,

    /// How often to refresh this node's load score in the registry
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub load_report_interval: Duration,
}

impl EdgeConfig {
    /// Socket address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Address published to the edge-node registry
    pub fn advertised(&self) -> String {
        self.advertised_addr
            .clone()
            .unwrap_or_else(|| format!("ws://{}:{}/", self.bind, self.port))
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 9001,
            advertised_addr: None,
            broker_sub_addr: "127.0.0.1:7402".to_string(),
            load_report_interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EdgeConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:9001");
        assert_eq!(config.advertised(), "ws://127.0.0.1:9001/");
        assert_eq!(config.load_report_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_advertised_override() {
        let toml = r#"advertised_addr = "ws://push-1.example.com:9001/""#;
        let config: EdgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.advertised(), "ws://push-1.example.com:9001/");
    }

    #[test]
    fn test_humantime_interval() {
        let config: EdgeConfig = toml::from_str("load_report_interval = \"500ms\"").unwrap();
        assert_eq!(config.load_report_interval, Duration::from_millis(500));
    }
}
