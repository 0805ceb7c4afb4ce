//! Tests for subscriber bookkeeping

use super::*;
use bytes::Bytes;
use courier_protocol::{PushFrame, Token, PUSH_TOPIC};

fn make_frame(token: &str) -> PushFrame {
    PushFrame::push(Token::new(token), Bytes::from_static(b"{}"))
}

#[tokio::test]
async fn test_subscribe_assigns_unique_ids() {
    let registry = SubscriberRegistry::new();
    let (id1, _rx1) = registry.subscribe(PUSH_TOPIC);
    let (id2, _rx2) = registry.subscribe(PUSH_TOPIC);

    assert_ne!(id1, id2);
    assert_eq!(registry.count(), 2);
}

#[tokio::test]
async fn test_unsubscribe_removes() {
    let registry = SubscriberRegistry::new();
    let (id, _rx) = registry.subscribe(PUSH_TOPIC);

    registry.unsubscribe(id).unwrap();
    assert_eq!(registry.count(), 0);

    assert!(matches!(
        registry.unsubscribe(id),
        Err(BrokerError::SubscriberNotFound { .. })
    ));
}

#[tokio::test]
async fn test_broadcast_reaches_matching_filter() {
    let registry = SubscriberRegistry::new();
    let (_id, mut rx) = registry.subscribe(PUSH_TOPIC);

    let frame = make_frame("t1");
    assert_eq!(registry.broadcast(&frame), 1);
    assert_eq!(rx.try_recv().unwrap(), frame);
}

#[tokio::test]
async fn test_broadcast_filters_by_prefix() {
    let registry = SubscriberRegistry::new();
    let (_a, mut rx_push) = registry.subscribe("PUSH");
    let (_b, mut rx_all) = registry.subscribe("");
    let (_c, mut rx_other) = registry.subscribe("OTHER");

    let frame = make_frame("t1");
    assert_eq!(registry.broadcast(&frame), 2);
    assert!(rx_push.try_recv().is_ok());
    assert!(rx_all.try_recv().is_ok());
    assert!(rx_other.try_recv().is_err());
}

#[tokio::test]
async fn test_broadcast_to_every_subscriber() {
    let registry = SubscriberRegistry::new();
    let (_a, mut rx1) = registry.subscribe(PUSH_TOPIC);
    let (_b, mut rx2) = registry.subscribe(PUSH_TOPIC);

    let frame = make_frame("t1");
    assert_eq!(registry.broadcast(&frame), 2);
    assert_eq!(rx1.try_recv().unwrap(), frame);
    assert_eq!(rx2.try_recv().unwrap(), frame);
}

#[tokio::test]
async fn test_cleanup_disconnected() {
    let registry = SubscriberRegistry::new();
    let (_id, rx) = registry.subscribe(PUSH_TOPIC);
    assert_eq!(registry.count(), 1);

    drop(rx);
    assert_eq!(registry.cleanup_disconnected(), 1);
    assert_eq!(registry.count(), 0);
}
