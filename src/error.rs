//! Error types for fcgi-wire.

use thiserror::Error;

/// Main error type for all fcgi-wire I/O operations.
///
/// The codec itself never returns errors: building signals failure through
/// [`MessageBuilder::good`](crate::protocol::MessageBuilder::good) and parsing
/// through record validity. Only the connection/transport collaborators are
/// fallible.
#[derive(Debug, Error)]
pub enum FcgiWireError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error (invalid record header in the byte stream).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed before a complete message arrived.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using FcgiWireError.
pub type Result<T> = std::result::Result<T, FcgiWireError>;
