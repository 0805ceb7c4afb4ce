//! Error types for the protocol crate

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire data
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Malformed or truncated wire data
    #[error("codec error: {0}")]
    Codec(String),

    /// Frame exceeds the maximum allowed size
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
