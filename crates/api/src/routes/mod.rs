//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod nodes;
pub mod ops;
pub mod queue;
pub mod token;

use axum::Router;

use courier_protocol::QueueId;

use crate::state::AppState;

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Operations routes (health - no token)
        .merge(ops::routes())
        // Token issuance
        .merge(token::routes())
        // Queue lifecycle and message history
        .merge(queue::routes())
        // Edge-node listing for connecting clients
        .merge(nodes::routes())
        .with_state(state)
}

/// URL path a queue is addressed by
pub(crate) fn queue_url(queue_id: &QueueId) -> String {
    format!("/queue/{queue_id}/")
}
