//! WebSocket edge server
//!
//! `EdgeServer` accepts client WebSocket connections and runs each through
//! the connection state machine:
//!
//! - **Connecting**: the first well-formed text message must be
//!   `token: <token>`; anything else is ignored while waiting
//! - **Identified**: the token is registered in the connection table and a
//!   select loop services inbound socket traffic and outbound deliveries
//!   concurrently, so one token's delivery never blocks another's
//! - **Closed**: socket close/error, a failed write, or supersession by a
//!   newer connection for the same token ends the loop; the table entry is
//!   removed only if it still belongs to this connection
//!
//! After identification the protocol is pure server-push: the node writes
//! one JSON-serialized message object per delivery and ignores client text.
//!
//! Alongside the accept loop the server runs the broker feed and the load
//! reporter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use courier_protocol::Token;
use courier_storage::Storage;

use crate::error::Result;
use crate::feed::run_broker_feed;
use crate::report::run_load_report;
use crate::table::ConnectionTable;

/// Prefix of the client's identification message
pub const TOKEN_PREFIX: &str = "token: ";

/// Edge server configuration
#[derive(Debug, Clone)]
pub struct EdgeServerConfig {
    /// Address to bind the WebSocket listener to
    pub bind_addr: String,
    /// Address published to the edge-node registry
    pub advertised_addr: String,
    /// Address of the broker's subscribe side
    pub broker_sub_addr: String,
    /// How often to refresh this node's load score
    pub load_report_interval: Duration,
}

impl Default for EdgeServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9001".to_string(),
            advertised_addr: "ws://127.0.0.1:9001/".to_string(),
            broker_sub_addr: "127.0.0.1:7402".to_string(),
            load_report_interval: Duration::from_secs(10),
        }
    }
}

/// One edge node's connection multiplexer
pub struct EdgeServer {
    listener: TcpListener,
    config: EdgeServerConfig,
    table: Arc<ConnectionTable>,
    storage: Arc<dyn Storage>,
}

impl EdgeServer {
    /// Bind the WebSocket listener
    pub async fn bind(config: EdgeServerConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self {
            listener,
            config,
            table: Arc::new(ConnectionTable::new()),
            storage,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle onto this node's connection table
    pub fn table(&self) -> Arc<ConnectionTable> {
        Arc::clone(&self.table)
    }

    /// Run the node until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            addr = ?self.listener.local_addr().ok(),
            advertised = %self.config.advertised_addr,
            broker = %self.config.broker_sub_addr,
            "edge node listening"
        );

        tokio::spawn(run_broker_feed(
            self.config.broker_sub_addr.clone(),
            Arc::clone(&self.table),
            cancel.clone(),
        ));
        tokio::spawn(run_load_report(
            Arc::clone(&self.storage),
            Arc::clone(&self.table),
            self.config.advertised_addr.clone(),
            self.config.load_report_interval,
            cancel.clone(),
        ));

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let table = Arc::clone(&self.table);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, table).await {
                                debug!(%addr, error = %e, "connection ended");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },

                _ = cancel.cancelled() => {
                    info!("edge node shutting down");
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

/// Drive one client connection through Connecting, Identified, Closed
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    table: Arc<ConnectionTable>,
) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    // Connecting: wait for the identification message
    let token = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Some(token) = text.strip_prefix(TOKEN_PREFIX) {
                    break Token::new(token);
                }
                debug!(%addr, "ignoring message before identification");
            }
            Some(Ok(Message::Ping(payload))) => {
                write.send(Message::Pong(payload)).await?;
            }
            Some(Ok(Message::Close(_))) | None => return Ok(()),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    };

    let (sender, mut deliveries) = ConnectionTable::channel();
    let conn_id = table.register(token.clone(), sender);
    info!(%addr, token = %token, conn_id, "connection identified");

    // Identified: deliveries and socket traffic are independent event
    // sources serviced by one loop
    loop {
        tokio::select! {
            delivery = deliveries.recv() => match delivery {
                Some(payload) => {
                    if let Err(e) = write.send(Message::Text(payload)).await {
                        debug!(token = %token, conn_id, error = %e, "delivery write failed");
                        break;
                    }
                }
                // Sender dropped: superseded by a newer connection, or
                // evicted after a failed deliver
                None => break,
            },

            inbound = read.next() => match inbound {
                Some(Ok(Message::Ping(payload))) => {
                    if write.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(token = %token, conn_id, error = %e, "socket read failed");
                    break;
                }
            }
        }
    }

    table.unregister(&token, conn_id);
    let _ = write.close().await;
    info!(%addr, token = %token, conn_id, "connection closed");
    Ok(())
}

#[cfg(test)]
#[path = "server_test.rs"]
mod tests;
