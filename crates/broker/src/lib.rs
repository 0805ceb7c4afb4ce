//! Courier broker
//!
//! A topic-filtered publish/subscribe transport that decouples any number of
//! stateless HTTP front-ends from any number of connection-holding edge
//! nodes. Neither side knows the other's identity or count.
//!
//! # Architecture
//!
//! ```text
//! Publisher ──┐                       ┌── Subscriber (edge node)
//! Publisher ──┼──► pull side ── BrokerServer ── sub side ──┼── Subscriber
//! Publisher ──┘        (forwarder, topic filter)           └── Subscriber
//! ```
//!
//! # Contract
//!
//! - Every subscriber connected with a matching topic filter at send time
//!   receives the frame, in the order it was sent relative to other frames
//!   from the same publisher.
//! - No ordering guarantee across distinct publishers.
//! - No persistence: a subscriber that is not connected at send time never
//!   sees the frame. At-most-once here; overall at-least-once delivery comes
//!   from the storage-backed since-query fallback, not from the broker.
//! - Slow subscribers drop frames rather than buffer without bound.

mod bridge;
mod error;
mod publish;
mod registry;
mod server;
mod subscribe;
mod wire;

pub use bridge::PushBridge;
pub use error::{BrokerError, Result};
pub use publish::Publisher;
pub use registry::SubscriberRegistry;
pub use server::BrokerServer;
pub use subscribe::Subscriber;
