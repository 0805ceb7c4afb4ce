//! Live-connection table
//!
//! Maps one token to at most one open connection on this node. The table is
//! owned by its [`EdgeServer`](crate::EdgeServer) and only touched through
//! these operations - delivery from other components goes through
//! [`ConnectionTable::deliver`], never by reaching into the map.
//!
//! Every registration gets a connection id; removal is conditional on that
//! id, so a stale connection closing late never evicts the newer connection
//! that superseded it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use courier_protocol::Token;

/// Queued deliveries per connection before the entry is treated as dead
const DELIVERY_BUFFER: usize = 256;

/// Outcome of a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Payload handed to the token's live connection
    Delivered,
    /// No live connection for the token - a no-op, not an error
    NoConnection,
    /// The connection could not accept the payload; its entry was removed
    Failed,
}

/// One live connection's send side
struct LiveConnection {
    conn_id: u64,
    sender: mpsc::Sender<String>,
}

/// Token-to-connection map for one edge node
#[derive(Default)]
pub struct ConnectionTable {
    connections: RwLock<HashMap<Token, LiveConnection>>,
    next_conn_id: AtomicU64,
}

impl ConnectionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the delivery channel for a new connection
    pub fn channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(DELIVERY_BUFFER)
    }

    /// Register a connection for a token, superseding any prior entry
    ///
    /// Returns the connection id to pass back to [`unregister`](Self::unregister).
    /// The superseded entry's sender is dropped, which ends the old
    /// connection's delivery loop.
    pub fn register(&self, token: Token, sender: mpsc::Sender<String>) -> u64 {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let superseded = self
            .connections
            .write()
            .insert(token.clone(), LiveConnection { conn_id, sender });

        if let Some(old) = superseded {
            debug!(token = %token, old_conn_id = old.conn_id, conn_id, "connection superseded");
        }
        conn_id
    }

    /// Deliver a payload to the token's live connection
    ///
    /// A send failure removes the entry immediately - a dead entry must not
    /// silently swallow future messages.
    pub fn deliver(&self, token: &Token, payload: String) -> Delivery {
        let (conn_id, sender) = {
            let connections = self.connections.read();
            match connections.get(token) {
                Some(conn) => (conn.conn_id, conn.sender.clone()),
                None => return Delivery::NoConnection,
            }
        };

        if sender.try_send(payload).is_ok() {
            Delivery::Delivered
        } else {
            // Full or closed: either way the connection is not draining
            self.unregister(token, conn_id);
            Delivery::Failed
        }
    }

    /// Remove the token's entry if it still belongs to this connection
    ///
    /// Returns whether an entry was removed. A connection that was
    /// superseded finds someone else's entry here and leaves it alone.
    pub fn unregister(&self, token: &Token, conn_id: u64) -> bool {
        let mut connections = self.connections.write();
        if connections.get(token).is_some_and(|c| c.conn_id == conn_id) {
            connections.remove(token);
            return true;
        }
        false
    }

    /// Number of live connections, used as this node's load score
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether the table holds no connections
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
