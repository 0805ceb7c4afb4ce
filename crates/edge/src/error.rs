//! Error types for the edge crate

use std::io;

use thiserror::Error;

use courier_storage::StorageError;

/// Errors that can occur on an edge node
#[derive(Error, Debug)]
pub enum EdgeError {
    /// I/O error (listener, socket operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket handshake or protocol failure
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Node registry update failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for edge operations
pub type Result<T> = std::result::Result<T, EdgeError>;
