//! Broker server - the forwarder between publishers and subscribers
//!
//! Two TCP listeners:
//!
//! - **pull side**: publishers connect and stream frames; each connection's
//!   frames are forwarded in arrival order
//! - **sub side**: subscribers connect, send a topic filter as their first
//!   message, and then receive every matching frame
//!
//! The server holds no state beyond the live subscriber table: frames are
//! never persisted or replayed.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::registry::SubscriberRegistry;
use crate::wire;

/// Interval for sweeping disconnected subscribers out of the registry
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// The pub/sub forwarder
pub struct BrokerServer {
    pull_listener: TcpListener,
    sub_listener: TcpListener,
    registry: Arc<SubscriberRegistry>,
}

impl BrokerServer {
    /// Bind both sides of the forwarder
    pub async fn bind(pull_addr: &str, sub_addr: &str) -> Result<Self> {
        let pull_listener = TcpListener::bind(pull_addr).await?;
        let sub_listener = TcpListener::bind(sub_addr).await?;
        Ok(Self {
            pull_listener,
            sub_listener,
            registry: Arc::new(SubscriberRegistry::new()),
        })
    }

    /// Address publishers connect to
    pub fn pull_addr(&self) -> Result<SocketAddr> {
        Ok(self.pull_listener.local_addr()?)
    }

    /// Address subscribers connect to
    pub fn sub_addr(&self) -> Result<SocketAddr> {
        Ok(self.sub_listener.local_addr()?)
    }

    /// Handle onto the live subscriber table
    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run the forwarder until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            pull = ?self.pull_listener.local_addr().ok(),
            sub = ?self.sub_listener.local_addr().ok(),
            "broker listening"
        );

        let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            tokio::select! {
                accepted = self.pull_listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            debug!(%addr, "publisher connected");
                            if let Err(e) = handle_publisher(stream, registry).await {
                                debug!(%addr, error = %e, "publisher connection ended");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept publisher"),
                },

                accepted = self.sub_listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            if let Err(e) = handle_subscriber(stream, registry).await {
                                debug!(%addr, error = %e, "subscriber connection ended");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept subscriber"),
                },

                _ = cleanup_interval.tick() => {
                    let removed = self.registry.cleanup_disconnected();
                    if removed > 0 {
                        debug!(removed, "cleaned up disconnected subscribers");
                    }
                }

                _ = cancel.cancelled() => {
                    info!("broker shutting down");
                    return;
                }
            }
        }
    }

    /// Run in a background task
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

/// Forward one publisher connection's frames into the registry
async fn handle_publisher(mut stream: TcpStream, registry: Arc<SubscriberRegistry>) -> Result<()> {
    while let Some(frame) = wire::read_frame(&mut stream).await? {
        let sent = registry.broadcast(&frame);
        debug!(topic = %frame.topic, token = %frame.token, sent, "frame forwarded");
    }
    Ok(())
}

/// Push matching frames to one subscriber connection
async fn handle_subscriber(mut stream: TcpStream, registry: Arc<SubscriberRegistry>) -> Result<()> {
    let Some(topic) = wire::read_topic(&mut stream).await? else {
        return Ok(());
    };

    let (id, mut receiver) = registry.subscribe(&topic);
    info!(subscriber_id = id, topic = %topic, "subscriber joined");

    while let Some(frame) = receiver.recv().await {
        if let Err(e) = wire::write_frame(&mut stream, &frame).await {
            warn!(subscriber_id = id, error = %e, "subscriber write failed");
            break;
        }
    }

    let _ = registry.unsubscribe(id);
    info!(subscriber_id = id, "subscriber left");
    Ok(())
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
