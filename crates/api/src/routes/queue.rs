//! Queue endpoints
//!
//! Queue lifecycle and message history.
//!
//! | Endpoint | Ownership check | Notes |
//! |----------|-----------------|-------|
//! | `GET /queue/?token=T` | - | list the token's domain queues |
//! | `POST /queue/` | - | register a queue for `(token, domain)` |
//! | `GET /queue/{id}/?token=T&since=TS` | token owns queue | history, strictly after `since` |
//! | `POST /queue/{id}/` | queue exists | store, then fan out |
//! | `DELETE /queue/{id}/?token=T` | token owns queue | later posts to the id fail |
//!
//! Ownership failures and unknown queue ids return the same 404 body.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use courier_protocol::{Message, QueueId, Timestamp, Token};

use crate::error::{ApiError, FieldError};
use crate::routes::queue_url;
use crate::state::AppState;

// =============================================================================
// Request/Response types
// =============================================================================

/// Create queue request
#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
    /// Owning token
    #[serde(default)]
    pub token: String,
    /// Owning domain
    #[serde(default)]
    pub domain: String,
}

/// Create queue response
#[derive(Debug, Serialize)]
pub struct CreateQueueResponse {
    /// URL of the freshly registered queue
    pub queue: String,
}

/// Query parameters carrying only the caller's token
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

/// Message history query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub token: String,
    /// Only messages with a strictly greater timestamp are returned
    pub since: Option<Timestamp>,
}

/// Message list response, shared by post and history
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

// =============================================================================
// Routes
// =============================================================================

/// Queue routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/queue/", get(list_queues).post(create_queue))
        .route(
            "/queue/{id}/",
            get(get_messages).post(post_message).delete(delete_queue),
        )
}

// =============================================================================
// Handlers
// =============================================================================

/// Map the token's registered domains to queue URLs
///
/// GET /queue/?token=T
async fn list_queues(
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let token = require_token(&query.token)?;
    let queues = state.storage.get_queues(&token).await?;

    Ok(Json(
        queues
            .into_iter()
            .map(|(domain, queue_id)| (domain, queue_url(&queue_id)))
            .collect(),
    ))
}

/// Register a queue for a (token, domain) pair
///
/// POST /queue/
async fn create_queue(
    State(state): State<AppState>,
    Json(request): Json<CreateQueueRequest>,
) -> Result<Json<CreateQueueResponse>, ApiError> {
    let mut missing = Vec::new();
    if request.token.trim().is_empty() {
        missing.push(FieldError::missing("token"));
    }
    if request.domain.trim().is_empty() {
        missing.push(FieldError::missing("domain"));
    }
    if !missing.is_empty() {
        return Err(ApiError::Validation(missing));
    }

    let queue_id = QueueId::generate();
    state
        .storage
        .new_queue(&queue_id, &Token::new(request.token), &request.domain)
        .await?;

    tracing::info!(queue = %queue_id, domain = %request.domain, "queue created");

    Ok(Json(CreateQueueResponse {
        queue: queue_url(&queue_id),
    }))
}

/// Read a queue's message history
///
/// GET /queue/{id}/?token=T&since=TS
async fn get_messages(
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let token = require_token(&query.token)?;
    let queue_id = QueueId::new(id);

    if !state.storage.user_owns_queue(&token, &queue_id).await? {
        return Err(ApiError::NotFound);
    }

    let messages = state.storage.get_messages(&queue_id, query.since).await?;
    Ok(Json(MessagesResponse { messages }))
}

/// Store a message, then fan it out to the owner's live connections
///
/// POST /queue/{id}/
async fn post_message(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let queue_id = QueueId::new(id);

    // The owner lookup doubles as the existence check; an unknown or
    // deleted queue short-circuits before any side effect
    let owner = state
        .storage
        .get_user_for_queue(&queue_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let message = state.storage.new_message(&queue_id, body).await?;

    // Durable write done; the fan-out publish cannot fail the request
    state.bridge.publish(&owner, &message);

    tracing::debug!(queue = %queue_id, key = %message.key, "message posted");

    Ok(Json(MessagesResponse {
        messages: vec![message],
    }))
}

/// Remove a queue; later posts to its id fail
///
/// DELETE /queue/{id}/?token=T
async fn delete_queue(
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let token = require_token(&query.token)?;
    let queue_id = QueueId::new(id);

    if !state.storage.user_owns_queue(&token, &queue_id).await? {
        return Err(ApiError::NotFound);
    }
    state.storage.delete_queue(&queue_id).await?;

    tracing::info!(queue = %queue_id, "queue deleted");

    Ok(Json(serde_json::json!({})))
}

fn require_token(token: &str) -> Result<Token, ApiError> {
    if token.trim().is_empty() {
        return Err(ApiError::Validation(vec![FieldError::missing("token")]));
    }
    Ok(Token::new(token))
}
