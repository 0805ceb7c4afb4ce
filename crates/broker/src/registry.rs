//! Subscriber bookkeeping for the broker server
//!
//! Each connected subscriber gets a bounded channel and a topic filter.
//! Fan-out uses `try_send`: a subscriber that cannot keep up loses frames
//! instead of stalling publishers or other subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use courier_protocol::PushFrame;

use crate::error::{BrokerError, Result};

/// Counter for generating unique subscriber ids
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Channel buffer size per subscriber
const CHANNEL_BUFFER_SIZE: usize = 256;

/// One connected subscriber
#[derive(Debug)]
struct Subscription {
    id: u64,
    /// Prefix topic filter; empty matches everything
    topic: String,
    sender: mpsc::Sender<PushFrame>,
}

impl Subscription {
    fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Manages all active subscriptions
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<Vec<Arc<Subscription>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with a topic filter
    ///
    /// Returns the subscriber id and the frame receiver.
    pub fn subscribe(&self, topic: impl Into<String>) -> (u64, mpsc::Receiver<PushFrame>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let subscription = Arc::new(Subscription {
            id: SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            topic: topic.into(),
            sender,
        });
        let id = subscription.id;
        self.subscribers.write().push(subscription);
        (id, receiver)
    }

    /// Remove a subscriber by id
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.id != id);

        if subscribers.len() == original_len {
            return Err(BrokerError::SubscriberNotFound { id });
        }
        Ok(())
    }

    /// Number of active subscribers
    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Fan a frame out to every matching subscriber
    ///
    /// Returns the number of subscribers the frame was handed to.
    pub fn broadcast(&self, frame: &PushFrame) -> usize {
        let subscribers = self.subscribers.read();
        let mut sent = 0;

        for subscription in subscribers.iter() {
            if !frame.matches(&subscription.topic) {
                continue;
            }
            if subscription.sender.try_send(frame.clone()).is_ok() {
                sent += 1;
            }
        }

        sent
    }

    /// Drop subscriptions whose connection task is gone
    pub fn cleanup_disconnected(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.is_connected());
        original_len - subscribers.len()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
