//! Storage backend configuration

use serde::Deserialize;

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory maps; everything is lost on process exit
    Memory,
    /// Durable SQLite database (default)
    #[default]
    Sqlite,
}

/// Storage configuration
///
/// The API and edge processes of one deployment must point at the same
/// database so queue ownership and the edge-node registry are shared.
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "sqlite"
/// path = "data/courier.db"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use (memory, sqlite)
    /// Default: sqlite
    pub backend: StorageBackend,

    /// Path to the SQLite database file (sqlite backend only)
    /// Default: data/courier.db
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: "data/courier.db".to_string(),
        }
    }
}
