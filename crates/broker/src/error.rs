//! Error types for the broker crate

use std::io;

use thiserror::Error;

use courier_protocol::ProtocolError;

/// Errors that can occur in the pub/sub fabric
#[derive(Error, Debug)]
pub enum BrokerError {
    /// I/O error (socket operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed wire data
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The publisher's outbound queue is full or its writer task is gone
    #[error("publish queue unavailable")]
    PublishQueueUnavailable,

    /// Subscriber not found
    #[error("subscriber not found: {id}")]
    SubscriberNotFound { id: u64 },
}

/// Result type for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
