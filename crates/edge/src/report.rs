//! Load reporting
//!
//! Each edge node periodically writes its live-connection count into the
//! node registry under its advertised address. The first tick fires
//! immediately, which doubles as the node's startup registration.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use courier_storage::Storage;

use crate::table::ConnectionTable;

/// Refresh this node's registry entry until cancelled
pub async fn run_load_report(
    storage: Arc<dyn Storage>,
    table: Arc<ConnectionTable>,
    address: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let load = table.len() as u32;
                match storage.add_edge_node(&address, load).await {
                    Ok(()) => debug!(address = %address, load, "load reported"),
                    Err(e) => warn!(address = %address, error = %e, "load report failed"),
                }
            }
        }
    }
}
