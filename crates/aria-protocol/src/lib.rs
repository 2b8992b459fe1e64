//! Wire protocol shared with the companion player.
//!
//! Everything that crosses the socket is a JSON-encoded [`Payload`]:
//!
//! - `initialize` / `ping` / `pong` session envelopes
//! - `command` frames carrying a playback [`Command`] from the companion
//! - `state` frames carrying a [`StateUpdate`] pushed by the host
//!
//! The enums here mirror the companion's schema field for field, including
//! the tag spellings (`type`, `command`, `update`, `source`, `format`).
//! Unknown tags deserialize into explicit `Unknown` variants so newer peers
//! never break older hosts.

#![deny(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod lyric;
pub mod types;

pub use codec::{decode_binary, decode_frame, decode_text, encode, Frame};
pub use errors::{ProtocolError, Result};
pub use lyric::{clamp_time, MAX_SAFE_TIME};
pub use types::{
    AlbumCover, Artist, Command, ImageData, LyricContent, LyricLine, LyricWord, MusicInfo,
    Payload, StateUpdate,
};
