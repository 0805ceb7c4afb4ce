//! Broker command - run the pub/sub forwarder

use anyhow::{Context, Result};
use tracing::info;

use courier_broker::BrokerServer;
use courier_config::Config;

use crate::cmd::shutdown_token;

/// Run the broker command
pub async fn run(config: Config) -> Result<()> {
    let server = BrokerServer::bind(&config.broker.pull_addr(), &config.broker.sub_addr())
        .await
        .context("failed to bind broker listeners")?;

    server.run(shutdown_token()).await;

    info!("broker shutdown complete");
    Ok(())
}
