//! Edge-node listing
//!
//! New clients pick where to open their WebSocket from this list. The
//! selection policy is "take the head": the registry is already sorted
//! least-loaded first, and a client retries down the list on its own if a
//! node is unreachable.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Node listing response
#[derive(Debug, Serialize)]
pub struct NodesResponse {
    /// Edge-node addresses, least loaded first
    pub nodes: Vec<String>,
}

/// Node routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/nodes/", get(list_nodes))
}

/// List edge nodes, least loaded first
///
/// GET /nodes/
async fn list_nodes(State(state): State<AppState>) -> Result<Json<NodesResponse>, ApiError> {
    Ok(Json(NodesResponse {
        nodes: state.storage.get_edge_nodes().await?,
    }))
}
