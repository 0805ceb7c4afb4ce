//! Courier protocol
//!
//! Core types shared by every Courier component:
//!
//! - [`Token`] - opaque bearer identifier for one client across devices
//! - [`QueueId`] - server-generated push queue identifier
//! - [`Message`] - one stored/delivered notification
//! - [`PushFrame`] - the 3-part fan-out wire frame `(topic, token, payload)`
//!
//! The frame codec uses simple length-prefixed binary framing so publishers
//! and subscribers in different processes (and potentially different
//! languages) can interoperate.

mod error;
mod frame;
mod message;

pub use error::{ProtocolError, Result};
pub use frame::{read_length_prefix, PushFrame, MAX_FRAME_LEN, PUSH_TOPIC};
pub use message::{Message, MessageKey, QueueId, Timestamp, Token};
