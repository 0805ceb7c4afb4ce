//! Publish bridge
//!
//! Translates a stored message into exactly one fan-out frame addressed to
//! the owning token. Fire-and-forget: the durable write already succeeded
//! before this is called, so a transport failure is logged and dropped,
//! never surfaced to the HTTP caller.

use tracing::warn;

use courier_protocol::{Message, PushFrame, Token};

use crate::publish::Publisher;

/// HTTP-side bridge into the fan-out fabric
#[derive(Debug, Clone)]
pub struct PushBridge {
    publisher: Publisher,
}

impl PushBridge {
    /// Wrap a publisher
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }

    /// Emit one `PUSH` frame for a stored message
    pub fn publish(&self, token: &Token, message: &Message) {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(token = %token, error = %e, "message not serializable, skipping fan-out");
                return;
            }
        };

        let frame = PushFrame::push(token.clone(), payload);
        if let Err(e) = self.publisher.send(frame) {
            warn!(token = %token, error = %e, "fan-out publish failed");
        }
    }
}
