//! Error types for payload encoding and decoding.

use thiserror::Error;

/// Errors surfaced while turning frames into payloads or back.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame body was not valid payload JSON.
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary frame did not hold UTF-8 text.
    #[error("binary frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Convenience alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
