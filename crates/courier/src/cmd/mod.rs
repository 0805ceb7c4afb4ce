//! Subcommands and shared bootstrap helpers

pub mod api;
pub mod broker;
pub mod edge;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use courier_config::{Config, StorageBackend};
use courier_storage::{MemStorage, SqliteStorage, Storage};

/// Load configuration, falling back to defaults when no file is present
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            // User explicitly provided config path - must exist
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Config::from_file(path).context("failed to load configuration")
        }
        None => {
            let default_paths = [
                PathBuf::from("configs/courier.toml"),
                PathBuf::from("courier.toml"),
            ];

            for path in &default_paths {
                if path.exists() {
                    info!(config = %path.display(), "using config file");
                    return Config::from_file(path).context("failed to load configuration");
                }
            }

            info!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Build the configured storage backend
pub async fn open_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    Ok(match config.storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory storage");
            Arc::new(MemStorage::new())
        }
        StorageBackend::Sqlite => Arc::new(
            SqliteStorage::open(&config.storage.path)
                .await
                .context("failed to open storage")?,
        ),
    })
}

/// Cancellation token that trips on ctrl-c
pub fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trip = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            trip.cancel();
        }
    });
    cancel
}
