//! Courier storage
//!
//! Authoritative bookkeeping for tokens, queue ownership, message history,
//! and the edge-node registry. The [`Storage`] trait is the single contract;
//! two backends implement it:
//!
//! - [`MemStorage`] - in-memory maps, used by tests and single-process demos
//! - [`SqliteStorage`] - durable SQLite store via SQLx
//!
//! # Semantics
//!
//! - Message history is ordered by `(timestamp, key)`; a `since` query
//!   returns the strict suffix with `timestamp > since`.
//! - A message posted to a queue also surfaces in the owning token's
//!   personal queue (the queue registered with an empty domain), which is
//!   how a client reads its whole cross-site history from one URL.
//! - The edge-node listing is ascending by load score with registration
//!   order as the tie-break; re-registering an address updates its load
//!   without changing its tie-break position.

mod error;
mod mem;
mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;

use courier_protocol::{Message, QueueId, Timestamp, Token};

pub use error::{Result, StorageError};
pub use mem::MemStorage;
pub use sqlite::SqliteStorage;

/// Storage capability set
///
/// All operations are safe under concurrent invocation. Append-then-read
/// for a single queue is linearizable: a message appended before a
/// `get_messages` call is issued appears in that call's result.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Issue a freshly generated, globally unique token
    async fn new_token(&self) -> Result<Token>;

    /// Record ownership of a queue by a `(token, domain)` pair
    ///
    /// Idempotent per `queue_id`; callers must generate fresh ids per
    /// registration. An empty domain marks the token's personal queue.
    async fn new_queue(&self, queue_id: &QueueId, token: &Token, domain: &str) -> Result<()>;

    /// Check whether the token owns the queue
    async fn user_owns_queue(&self, token: &Token, queue_id: &QueueId) -> Result<bool>;

    /// Check whether the domain owns the queue
    async fn domain_owns_queue(&self, domain: &str, queue_id: &QueueId) -> Result<bool>;

    /// Look up the owning token of a queue
    async fn get_user_for_queue(&self, queue_id: &QueueId) -> Result<Option<Token>>;

    /// Map the token's domains to their queues
    ///
    /// Returns an empty map when the token owns nothing - never an error.
    /// Re-registering a domain supersedes the earlier queue in this listing;
    /// personal queues (empty domain) are excluded.
    async fn get_queues(&self, token: &Token) -> Result<BTreeMap<String, QueueId>>;

    /// Remove a queue
    ///
    /// Fails with [`StorageError::QueueNotFound`] when the queue is unknown,
    /// so deleting twice fails on the second call.
    async fn delete_queue(&self, queue_id: &QueueId) -> Result<()>;

    /// Append a message with a fresh key and the current timestamp
    ///
    /// Fails with [`StorageError::QueueNotFound`] when the queue is unknown
    /// or deleted; the failed post must not leave any trace.
    async fn new_message(&self, queue_id: &QueueId, body: serde_json::Value) -> Result<Message>;

    /// Read a queue's history in ascending `(timestamp, key)` order
    ///
    /// With `since`, only messages with `timestamp > since` are returned.
    /// An unknown queue fails; a known queue with no messages returns an
    /// empty vec.
    async fn get_messages(
        &self,
        queue_id: &QueueId,
        since: Option<Timestamp>,
    ) -> Result<Vec<Message>>;

    /// Register an edge node or refresh its load score
    async fn add_edge_node(&self, address: &str, load: u32) -> Result<()>;

    /// List edge-node addresses, least loaded first
    async fn get_edge_nodes(&self) -> Result<Vec<String>>;
}
