//! Tests for the in-memory storage backend

use super::*;
use serde_json::json;

async fn queue_for(storage: &MemStorage, token: &Token, domain: &str) -> QueueId {
    let id = QueueId::generate();
    storage.new_queue(&id, token, domain).await.unwrap();
    id
}

#[tokio::test]
async fn test_new_token_unique() {
    let storage = MemStorage::new();
    let a = storage.new_token().await.unwrap();
    let b = storage.new_token().await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_queue_ownership() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    assert!(storage.user_owns_queue(&token, &queue).await.unwrap());
    assert!(storage.domain_owns_queue("x.com", &queue).await.unwrap());
    assert!(!storage
        .user_owns_queue(&Token::new("other"), &queue)
        .await
        .unwrap());
    assert!(!storage.domain_owns_queue("y.com", &queue).await.unwrap());
    assert_eq!(
        storage.get_user_for_queue(&queue).await.unwrap(),
        Some(token)
    );
}

#[tokio::test]
async fn test_get_queues_lists_created_domain() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "example.com").await;

    let queues = storage.get_queues(&token).await.unwrap();
    assert_eq!(queues.len(), 1);
    assert_eq!(queues.get("example.com"), Some(&queue));
}

#[tokio::test]
async fn test_get_queues_empty_for_unknown_token() {
    let storage = MemStorage::new();
    let queues = storage.get_queues(&Token::new("nobody")).await.unwrap();
    assert!(queues.is_empty());
}

#[tokio::test]
async fn test_get_queues_excludes_personal_queue() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    queue_for(&storage, &token, "").await;

    assert!(storage.get_queues(&token).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reregistration_supersedes_domain_listing() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let first = queue_for(&storage, &token, "x.com").await;
    let second = queue_for(&storage, &token, "x.com").await;
    assert_ne!(first, second);

    let queues = storage.get_queues(&token).await.unwrap();
    assert_eq!(queues.get("x.com"), Some(&second));
    // Both queue ids stay valid
    assert!(storage.user_owns_queue(&token, &first).await.unwrap());
}

#[tokio::test]
async fn test_delete_queue() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    storage.delete_queue(&queue).await.unwrap();
    assert_eq!(storage.get_user_for_queue(&queue).await.unwrap(), None);
    assert!(storage.get_queues(&token).await.unwrap().is_empty());

    // Second delete fails
    assert!(matches!(
        storage.delete_queue(&queue).await,
        Err(StorageError::QueueNotFound)
    ));
}

#[tokio::test]
async fn test_post_to_deleted_queue_fails() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;
    storage.delete_queue(&queue).await.unwrap();

    assert!(matches!(
        storage.new_message(&queue, json!({"title": "late"})).await,
        Err(StorageError::QueueNotFound)
    ));
    // The failed post must not resurrect the queue
    assert_eq!(storage.get_user_for_queue(&queue).await.unwrap(), None);
}

#[tokio::test]
async fn test_messages_ordered_and_unmodified() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    let first = storage
        .new_message(&queue, json!({"title": "one"}))
        .await
        .unwrap();
    let second = storage
        .new_message(&queue, json!({"title": "two"}))
        .await
        .unwrap();

    let messages = storage.get_messages(&queue, None).await.unwrap();
    assert_eq!(messages, vec![first.clone(), second.clone()]);
    assert_eq!(messages[0].body, json!({"title": "one"}));
    assert_eq!(messages[0].queue, queue);
}

#[tokio::test]
async fn test_empty_queue_returns_empty_not_error() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    assert!(storage.get_messages(&queue, None).await.unwrap().is_empty());
    assert!(matches!(
        storage.get_messages(&QueueId::new("missing"), None).await,
        Err(StorageError::QueueNotFound)
    ));
}

#[tokio::test]
async fn test_since_returns_strict_suffix() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    let mut posted = Vec::new();
    for i in 0..3 {
        posted.push(
            storage
                .new_message(&queue, json!({"n": i}))
                .await
                .unwrap(),
        );
        // Distinct millisecond timestamps
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    }

    let all = storage.get_messages(&queue, None).await.unwrap();
    assert_eq!(all, posted);

    let since = posted[1].timestamp;
    let suffix = storage.get_messages(&queue, Some(since)).await.unwrap();
    let expected: Vec<_> = all.iter().filter(|m| m.timestamp > since).cloned().collect();
    assert_eq!(suffix, expected);
    assert_eq!(suffix, vec![posted[2].clone()]);

    // since beyond the last timestamp yields nothing
    let later = posted[2].timestamp;
    assert!(storage.get_messages(&queue, Some(later)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_key_breaks_timestamp_ties() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let queue = queue_for(&storage, &token, "x.com").await;

    // Posted back to back; timestamps may or may not collide, but key
    // order must match post order either way
    let mut keys = Vec::new();
    for i in 0..10 {
        keys.push(
            storage
                .new_message(&queue, json!({"n": i}))
                .await
                .unwrap()
                .key,
        );
    }

    let got: Vec<_> = storage
        .get_messages(&queue, None)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.key)
        .collect();
    assert_eq!(got, keys);
}

#[tokio::test]
async fn test_message_surfaces_in_personal_queue() {
    let storage = MemStorage::new();
    let token = storage.new_token().await.unwrap();
    let personal = queue_for(&storage, &token, "").await;
    let site = queue_for(&storage, &token, "example.com").await;

    let message = storage
        .new_message(&site, json!({"title": "hello"}))
        .await
        .unwrap();

    let history = storage.get_messages(&personal, None).await.unwrap();
    assert_eq!(history, vec![message.clone()]);
    // The surfaced copy still names the queue it was posted to
    assert_eq!(history[0].queue, site);

    // Posting directly to the personal queue surfaces exactly once
    let receipt = storage
        .new_message(&personal, json!({"read": message.key.as_str()}))
        .await
        .unwrap();
    let history = storage.get_messages(&personal, None).await.unwrap();
    assert_eq!(history, vec![message, receipt]);
}

#[tokio::test]
async fn test_edge_nodes_sorted_by_load() {
    let storage = MemStorage::new();
    storage.add_edge_node("a", 8).await.unwrap();
    storage.add_edge_node("b", 6).await.unwrap();
    storage.add_edge_node("c", 7).await.unwrap();

    assert_eq!(
        storage.get_edge_nodes().await.unwrap(),
        vec!["b".to_string(), "c".to_string(), "a".to_string()]
    );
}

#[tokio::test]
async fn test_edge_node_ties_break_by_registration_order() {
    let storage = MemStorage::new();
    storage.add_edge_node("a", 5).await.unwrap();
    storage.add_edge_node("b", 5).await.unwrap();
    storage.add_edge_node("c", 5).await.unwrap();

    assert_eq!(
        storage.get_edge_nodes().await.unwrap(),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[tokio::test]
async fn test_edge_node_reregistration_updates_load() {
    let storage = MemStorage::new();
    storage.add_edge_node("a", 1).await.unwrap();
    storage.add_edge_node("b", 2).await.unwrap();
    storage.add_edge_node("a", 3).await.unwrap();

    assert_eq!(
        storage.get_edge_nodes().await.unwrap(),
        vec!["b".to_string(), "a".to_string()]
    );
}
