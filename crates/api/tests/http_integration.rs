//! Integration tests for the HTTP surface
//!
//! These drive the full router through `tower::ServiceExt::oneshot` with
//! an in-memory storage backend. The fan-out publisher points at a dead
//! address; publishes are dropped, which must never affect a response.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use courier_api::{build_router, AppState};
use courier_broker::{Publisher, PushBridge};
use courier_storage::{MemStorage, Storage};

fn test_app() -> (Router, Arc<MemStorage>) {
    let storage = Arc::new(MemStorage::new());
    // Nothing listens on this address; fan-out frames are shed silently
    let bridge = PushBridge::new(Publisher::connect("127.0.0.1:9"));
    let state = AppState::new(Arc::clone(&storage) as Arc<dyn Storage>, bridge);
    (build_router(state), storage)
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

/// Issue a token; returns (token, personal queue URL)
async fn issue_token(app: &Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/token/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    (
        json["token"].as_str().unwrap().to_string(),
        json["queue"].as_str().unwrap().to_string(),
    )
}

/// Create a queue; returns its URL
async fn create_queue(app: &Router, token: &str, domain: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/queue/",
            Some(json!({"token": token, "domain": domain})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    json["queue"].as_str().unwrap().to_string()
}

/// Post a message; returns the stored message object
async fn post_message(app: &Router, queue_url: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(request(Method::POST, queue_url, Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    json["messages"][0].clone()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_issue_token_returns_personal_queue() {
    let (app, _storage) = test_app();
    let (token, queue) = issue_token(&app).await;

    assert_eq!(token.len(), 32);
    assert!(queue.starts_with("/queue/"));
    assert!(queue.ends_with('/'));
}

#[tokio::test]
async fn test_created_queue_appears_in_listing() {
    let (app, _storage) = test_app();
    let (token, _) = issue_token(&app).await;
    let queue = create_queue(&app, &token, "example.com").await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, &format!("/queue/?token={token}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["example.com"], json!(queue));
    // The personal queue stays out of the domain listing
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_queue_lists_every_missing_field() {
    let (app, _storage) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/queue/", Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["token", "domain"]);
}

#[tokio::test]
async fn test_empty_domain_is_rejected() {
    let (app, _storage) = test_app();
    let (token, _) = issue_token(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/queue/",
            Some(json!({"token": token, "domain": ""})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = response_json(response).await;
    assert_eq!(json["fields"][0]["field"], "domain");
}

#[tokio::test]
async fn test_post_then_history_with_since() {
    let (app, _storage) = test_app();
    let (token, _) = issue_token(&app).await;
    let queue = create_queue(&app, &token, "example.com").await;

    let first = post_message(&app, &queue, json!({"title": "one"})).await;
    let second = post_message(&app, &queue, json!({"title": "two"})).await;
    assert_eq!(first["body"], json!({"title": "one"}));

    let response = app
        .clone()
        .oneshot(request(Method::GET, &format!("{queue}?token={token}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["key"], first["key"]);
    assert_eq!(messages[1]["key"], second["key"]);

    // A since-query at the last timestamp returns the strict suffix
    let since = first["timestamp"].as_i64().unwrap();
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("{queue}?token={token}&since={since}"),
            None,
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    let suffix = json["messages"].as_array().unwrap();
    for message in suffix {
        assert!(message["timestamp"].as_i64().unwrap() > since);
    }
}

#[tokio::test]
async fn test_history_requires_owning_token() {
    let (app, _storage) = test_app();
    let (owner, _) = issue_token(&app).await;
    let (intruder, _) = issue_token(&app).await;
    let queue = create_queue(&app, &owner, "example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("{queue}?token={intruder}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The unauthorized body matches the unknown-queue body exactly
    let unauthorized = response_json(response).await;
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/queue/no-such-queue/?token={intruder}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await, unauthorized);
}

#[tokio::test]
async fn test_post_to_unknown_queue_fails() {
    let (app, _storage) = test_app();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/queue/no-such-queue/",
            Some(json!({"title": "lost"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_queue_invalidates_posts() {
    let (app, _storage) = test_app();
    let (token, _) = issue_token(&app).await;
    let queue = create_queue(&app, &token, "example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("{queue}?token={token}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Posts to the deleted id fail instead of silently succeeding
    let response = app
        .clone()
        .oneshot(request(Method::POST, &queue, Some(json!({"title": "late"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting twice fails on the second call
    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("{queue}?token={token}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_requires_owning_token() {
    let (app, _storage) = test_app();
    let (owner, _) = issue_token(&app).await;
    let (intruder, _) = issue_token(&app).await;
    let queue = create_queue(&app, &owner, "example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("{queue}?token={intruder}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The queue is untouched
    let response = app
        .clone()
        .oneshot(request(Method::GET, &format!("{queue}?token={owner}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_message_surfaces_in_personal_history() {
    let (app, _storage) = test_app();
    let (token, personal) = issue_token(&app).await;
    let queue = create_queue(&app, &token, "example.com").await;

    let posted = post_message(&app, &queue, json!({"title": "hello"})).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("{personal}?token={token}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["messages"][0]["key"], posted["key"]);
    assert_eq!(json["messages"][0]["body"], json!({"title": "hello"}));
}

#[tokio::test]
async fn test_nodes_listed_least_loaded_first() {
    let (app, storage) = test_app();
    storage.add_edge_node("a", 8).await.unwrap();
    storage.add_edge_node("b", 6).await.unwrap();
    storage.add_edge_node("c", 7).await.unwrap();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/nodes/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["nodes"], json!(["b", "c", "a"]));
}

#[tokio::test]
async fn test_health() {
    let (app, _storage) = test_app();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "ok"}));
}
