//! Edge command - run a connection-holding edge node

use anyhow::{Context, Result};
use tracing::info;

use courier_config::Config;
use courier_edge::{EdgeServer, EdgeServerConfig};

use crate::cmd::{open_storage, shutdown_token};

/// Run the edge command
pub async fn run(config: Config) -> Result<()> {
    let storage = open_storage(&config).await?;

    let server_config = EdgeServerConfig {
        bind_addr: config.edge.bind_addr(),
        advertised_addr: config.edge.advertised(),
        broker_sub_addr: config.edge.broker_sub_addr.clone(),
        load_report_interval: config.edge.load_report_interval,
    };
    let server = EdgeServer::bind(server_config, storage)
        .await
        .context("failed to bind edge listener")?;

    server.run(shutdown_token()).await;

    info!("edge node shutdown complete");
    Ok(())
}
