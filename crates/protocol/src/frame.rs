//! Fan-out wire frame
//!
//! The broker carries 3-part frames `(topic, token, payload)`. Publishers
//! emit one frame per stored message; subscribers install a topic filter and
//! receive every matching frame.
//!
//! # Wire Format
//!
//! Frames are length-prefixed:
//! ```text
//! ┌──────────────┬──────────────────────────────────────────┐
//! │ 4 bytes      │ N bytes                                  │
//! │ length (BE)  │ 3 x (u32 length + bytes) segments        │
//! └──────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Topic filters match by prefix, so a subscriber filtering on `"PUSH"`
//! receives every frame whose topic starts with `PUSH` (and an empty filter
//! matches everything).

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};
use crate::message::Token;

/// Topic carried by every fan-out frame
pub const PUSH_TOPIC: &str = "PUSH";

/// Upper bound on a single frame body, applied before allocating
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// One fan-out frame: `(topic, token, payload)`
///
/// The payload is the JSON-serialized [`Message`](crate::Message); the codec
/// itself treats it as opaque bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PushFrame {
    /// Topic used for subscription filtering
    pub topic: String,
    /// Recipient token
    pub token: Token,
    /// Opaque payload bytes
    pub payload: Bytes,
}

impl PushFrame {
    /// Create a frame on the `PUSH` topic
    pub fn push(token: Token, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: PUSH_TOPIC.to_string(),
            token,
            payload: payload.into(),
        }
    }

    /// Check whether this frame matches a subscriber's topic filter
    #[inline]
    pub fn matches(&self, filter: &str) -> bool {
        self.topic.starts_with(filter)
    }

    /// Encode the frame with its length prefix
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(16 + self.payload.len());

        // Reserve space for length prefix (filled in at end)
        buf.put_u32(0);

        encode_segment(self.topic.as_bytes(), &mut buf);
        encode_segment(self.token.as_str().as_bytes(), &mut buf);
        encode_segment(&self.payload, &mut buf);

        let len = (buf.len() - 4) as u32;
        buf[0..4].copy_from_slice(&len.to_be_bytes());

        buf.freeze()
    }

    /// Decode a frame body (the bytes after the length prefix)
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        let topic = decode_segment(&mut buf)?;
        let token = decode_segment(&mut buf)?;
        let payload = decode_segment(&mut buf)?;

        if buf.has_remaining() {
            return Err(ProtocolError::Codec(format!(
                "{} trailing bytes after frame",
                buf.remaining()
            )));
        }

        Ok(Self {
            topic: String::from_utf8(topic.to_vec())
                .map_err(|e| ProtocolError::Codec(format!("topic not UTF-8: {e}")))?,
            token: Token::new(
                String::from_utf8(token.to_vec())
                    .map_err(|e| ProtocolError::Codec(format!("token not UTF-8: {e}")))?,
            ),
            payload,
        })
    }
}

fn encode_segment(bytes: &[u8], buf: &mut BytesMut) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn decode_segment(buf: &mut Bytes) -> Result<Bytes> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Codec("truncated segment length".into()));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::Codec("truncated segment".into()));
    }
    Ok(buf.split_to(len))
}

/// Read a 4-byte big-endian length prefix
pub fn read_length_prefix(buf: &[u8]) -> Option<u32> {
    if buf.len() < 4 {
        return None;
    }
    Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
