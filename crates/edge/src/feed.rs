//! Broker feed
//!
//! One task per edge node subscribes to the broker's `PUSH` topic and feeds
//! every frame into the connection table. Frames for tokens without a live
//! connection here are dropped - the client catches up from storage with a
//! since-query. The feed reconnects with a fixed delay if the broker goes
//! away; the broker layer is at-most-once, so frames sent while
//! disconnected are simply never seen here.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_broker::Subscriber;
use courier_protocol::PUSH_TOPIC;

use crate::table::ConnectionTable;

/// Delay between broker connection attempts
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Subscribe to the broker and deliver frames until cancelled
pub async fn run_broker_feed(
    broker_addr: String,
    table: Arc<ConnectionTable>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            connected = Subscriber::connect(&broker_addr, PUSH_TOPIC) => match connected {
                Ok(subscriber) => {
                    info!(addr = %broker_addr, "broker feed connected");
                    feed_frames(subscriber, &table, &cancel).await;
                    warn!(addr = %broker_addr, "broker feed disconnected");
                }
                Err(e) => {
                    debug!(addr = %broker_addr, error = %e, "broker unreachable");
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

/// Pump frames from one broker connection into the table
async fn feed_frames(
    mut subscriber: Subscriber,
    table: &ConnectionTable,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            received = subscriber.recv() => {
                let frame = match received {
                    Ok(Some(frame)) => frame,
                    Ok(None) => return,
                    Err(e) => {
                        warn!(error = %e, "broker feed read failed");
                        return;
                    }
                };

                match String::from_utf8(frame.payload.to_vec()) {
                    Ok(payload) => {
                        let outcome = table.deliver(&frame.token, payload);
                        debug!(token = %frame.token, ?outcome, "frame handled");
                    }
                    Err(e) => warn!(token = %frame.token, error = %e, "frame payload not UTF-8, dropped"),
                }
            }
        }
    }
}
