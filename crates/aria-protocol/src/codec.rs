//! Frame-level encode and decode.
//!
//! The companion may deliver a payload as a text frame or as a binary frame
//! holding UTF-8 JSON; both routes land in the same [`Payload`]. Decode
//! failures are reported, never fatal, so callers can drop the frame and
//! keep the session alive.

use crate::errors::Result;
use crate::types::Payload;

/// A transport frame before any protocol interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Raw binary frame.
    Binary(Vec<u8>),
}

/// Encode a payload into the JSON text sent over the socket.
pub fn encode(payload: &Payload) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

/// Decode a text frame.
pub fn decode_text(text: &str) -> Result<Payload> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a binary frame carrying UTF-8 JSON.
pub fn decode_binary(bytes: &[u8]) -> Result<Payload> {
    let text = std::str::from_utf8(bytes)?;
    decode_text(text)
}

/// Decode either frame kind.
pub fn decode_frame(frame: &Frame) -> Result<Payload> {
    match frame {
        Frame::Text(text) => decode_text(text),
        Frame::Binary(bytes) => decode_binary(bytes),
    }
}
