//! Identifier and message types
//!
//! `Token` and `QueueId` are opaque string newtypes; both are generated from
//! 16 random bytes and rendered as 32 lowercase hex characters.
//!
//! `Message` is one stored notification. Timestamps are epoch milliseconds
//! and deliberately coarse - two messages may share a timestamp. Keys embed
//! the timestamp plus a process-wide sequence number, so they are unique and
//! lexicographically monotonic, which makes `(timestamp, key)` a total order
//! over a queue's history.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Epoch milliseconds, the ordering and `since` key for messages
pub type Timestamp = i64;

/// Counter feeding the sequence half of message keys
static KEY_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Render 16 random bytes as 32 hex characters
fn random_hex() -> String {
    let bytes: [u8; 16] = rand::random();
    let mut out = String::with_capacity(32);
    for b in bytes {
        use fmt::Write;
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Opaque bearer identifier for one client/user across devices
///
/// Tokens are the join key between queues, messages, and live connections.
/// They never expire and carry no structure callers may rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap an existing token string
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh random token
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Get the token as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of one push queue, embedded in `/queue/<id>/` URLs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(String);

impl QueueId {
    /// Wrap an existing queue id string
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random queue id
    ///
    /// Callers registering a queue must generate a fresh id; ids are never
    /// reused across registrations.
    pub fn generate() -> Self {
        Self(random_hex())
    }

    /// Get the queue id as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QueueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for QueueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique, lexicographically monotonic message key
///
/// Keys break ties between messages whose coarse timestamps collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    /// Wrap an existing key string
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate the next key for the given timestamp
    ///
    /// Fixed-width hex keeps string comparison consistent with generation
    /// order: 13 hex digits of millis, 8 hex digits of sequence.
    pub fn generate(timestamp: Timestamp) -> Self {
        let seq = KEY_SEQUENCE.fetch_add(1, Ordering::Relaxed) as u32;
        Self(format!("{:013x}{:08x}", timestamp.max(0) as u64, seq))
    }

    /// Get the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MessageKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One notification instance
///
/// Messages are append-only: read state is represented by appending a
/// read-receipt message (body `{"read": <key>}`), never by mutating the
/// original. The same JSON shape is used for HTTP history responses and
/// WebSocket deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique key, the tiebreak when timestamps collide
    pub key: MessageKey,
    /// Epoch milliseconds; the `since` filter compares against this
    pub timestamp: Timestamp,
    /// The queue the message was posted to
    pub queue: QueueId,
    /// Arbitrary JSON payload
    pub body: serde_json::Value,
}

impl Message {
    /// Create a message stamped with the current time and a fresh key
    pub fn new(queue: &QueueId, body: serde_json::Value) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            key: MessageKey::generate(timestamp),
            timestamp,
            queue: queue.clone(),
            body,
        }
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
