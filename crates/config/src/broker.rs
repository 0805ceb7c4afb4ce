//! Broker forwarder configuration

use serde::Deserialize;

/// Broker configuration
///
/// The forwarder listens on two ports: publishers (HTTP front-ends) connect
/// to the pull port, subscribers (edge nodes) to the sub port.
///
/// # Example
///
/// ```toml
/// [broker]
/// bind = "0.0.0.0"
/// pull_port = 7401
/// sub_port = 7402
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Address to bind both listeners to
    /// Default: 127.0.0.1
    pub bind: String,

    /// Port publishers connect to
    /// Default: 7401
    pub pull_port: u16,

    /// Port subscribers connect to
    /// Default: 7402
    pub sub_port: u16,
}

impl BrokerConfig {
    /// Socket address of the pull (publisher) side
    pub fn pull_addr(&self) -> String {
        format!("{}:{}", self.bind, self.pull_port)
    }

    /// Socket address of the sub (subscriber) side
    pub fn sub_addr(&self) -> String {
        format!("{}:{}", self.bind, self.sub_port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            pull_port: 7401,
            sub_port: 7402,
        }
    }
}
