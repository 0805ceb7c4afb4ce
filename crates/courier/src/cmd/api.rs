//! Api command - run the HTTP front-end

use anyhow::{Context, Result};
use tracing::info;

use courier_api::{build_router, AppState};
use courier_broker::{Publisher, PushBridge};
use courier_config::Config;

use crate::cmd::{open_storage, shutdown_token};

/// Run the api command
pub async fn run(config: Config) -> Result<()> {
    let storage = open_storage(&config).await?;
    let bridge = PushBridge::new(Publisher::connect(&config.api.broker_publish_addr));
    let router = build_router(AppState::new(storage, bridge));

    let listener = tokio::net::TcpListener::bind(config.api.bind_addr())
        .await
        .context("failed to bind API listener")?;
    info!(
        addr = %listener.local_addr()?,
        broker = %config.api.broker_publish_addr,
        "API listening"
    );

    let cancel = shutdown_token();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("API server failed")?;

    info!("API shutdown complete");
    Ok(())
}
