//! Application state
//!
//! Shared state for API handlers: the storage backend and the fan-out
//! bridge. Handlers always write to storage first; the bridge publish is a
//! separate fire-and-forget step whose failure never affects the response.

use std::sync::Arc;

use courier_broker::PushBridge;
use courier_storage::Storage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Authoritative bookkeeping for tokens, queues, messages, and nodes
    pub storage: Arc<dyn Storage>,
    /// Fire-and-forget fan-out into the broker
    pub bridge: PushBridge,
}

impl AppState {
    /// Create new application state
    pub fn new(storage: Arc<dyn Storage>, bridge: PushBridge) -> Self {
        Self { storage, bridge }
    }
}
