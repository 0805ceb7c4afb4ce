//! Token issuance
//!
//! A fresh token comes with a personal queue (registered under the empty
//! domain): every message posted to any of the token's queues also
//! surfaces there, which is the URL cross-device clients poll for their
//! whole history.

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use courier_protocol::QueueId;

use crate::error::ApiError;
use crate::routes::queue_url;
use crate::state::AppState;

/// Token issuance response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// The freshly issued bearer token
    pub token: String,
    /// URL of the token's personal message history
    pub queue: String,
}

/// Token routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/token/", post(issue_token))
}

/// Issue a fresh token and its personal queue
///
/// POST /token/
async fn issue_token(State(state): State<AppState>) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.storage.new_token().await?;
    let queue_id = QueueId::generate();
    state.storage.new_queue(&queue_id, &token, "").await?;

    tracing::info!(token = %token, queue = %queue_id, "token issued");

    Ok(Json(TokenResponse {
        token: token.to_string(),
        queue: queue_url(&queue_id),
    }))
}
