//! Payload data model.
//!
//! Field names and tag spellings here are wire contract, not style. The
//! companion player parses frames case-sensitively, so every rename below
//! is load-bearing.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level envelope
// ─────────────────────────────────────────────────────────────────────────────

/// One frame's worth of meaning, in either direction.
///
/// Serialized as `{"type": "...", "value": ...}`; unit variants omit the
/// `value` field entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Payload {
    /// First frame the host sends on a freshly opened connection.
    Initialize,
    /// Liveness probe from the companion.
    Ping,
    /// Host answer to a [`Payload::Ping`].
    Pong,
    /// Remote playback command from the companion.
    Command(Command),
    /// Host-side playback state pushed to the companion.
    State(StateUpdate),
    /// Any tag this build does not know. Dropped without effect.
    #[serde(other)]
    Unknown,
}

/// Playback commands the companion may issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// Halt playback, keep position.
    Pause,
    /// Resume from the current position.
    Resume,
    /// Skip to the next track.
    ForwardSong,
    /// Return to the previous track.
    BackwardSong,
    /// Set output volume, nominally in `[0, 1]`.
    SetVolume {
        /// Requested volume level.
        volume: f64,
    },
    /// Seek to an absolute position in milliseconds.
    SeekPlayProgress {
        /// Requested position.
        progress: f64,
    },
    /// Any command tag this build does not know. Dropped without effect.
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// State updates
// ─────────────────────────────────────────────────────────────────────────────

/// One category of host playback state.
///
/// Each variant is self-contained so categories can be pushed independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update", rename_all = "camelCase")]
pub enum StateUpdate {
    /// Current track metadata.
    SetMusic(MusicInfo),
    /// Current album cover.
    SetCover(AlbumCover),
    /// Current lyric document.
    SetLyric(LyricContent),
    /// Playback position in milliseconds.
    Progress {
        /// Current position.
        progress: f64,
    },
    /// Output volume in `[0, 1]`.
    Volume {
        /// Current volume level.
        volume: f64,
    },
    /// Playback has paused.
    Paused,
    /// Playback has resumed.
    Resumed,
    /// A chunk of raw audio bytes.
    AudioData {
        /// Audio bytes, one element per byte.
        data: Vec<u8>,
    },
}

/// Track metadata for the currently loaded song.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicInfo {
    /// Stable track identifier.
    pub music_id: String,
    /// Display name of the track.
    pub music_name: String,
    /// Stable album identifier.
    pub album_id: String,
    /// Display name of the album.
    pub album_name: String,
    /// Credited artists, in display order.
    pub artists: Vec<Artist>,
    /// Track length in milliseconds.
    pub duration: f64,
}

/// One credited artist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Artist {
    /// Stable artist identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Album cover, either by reference or by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum AlbumCover {
    /// Cover addressed by URI; the companion fetches it itself.
    Uri {
        /// Image location.
        url: String,
    },
    /// Cover carried inline.
    Data {
        /// The image bytes and their type.
        image: ImageData,
    },
}

/// Inline image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lyrics
// ─────────────────────────────────────────────────────────────────────────────

/// Lyric document in one of the supported shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum LyricContent {
    /// Line/word timing structure.
    Structured {
        /// Timed lyric lines.
        lines: Vec<LyricLine>,
    },
    /// Raw TTML document, passed through verbatim.
    Ttml {
        /// The TTML source text.
        data: String,
    },
}

/// One timed lyric line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Line start, integer milliseconds.
    pub start_time: u64,
    /// Line end, integer milliseconds.
    pub end_time: u64,
    /// Timed words making up the line.
    pub words: Vec<LyricWord>,
    /// Whether this is a background vocal line.
    #[serde(rename = "isBG")]
    pub is_bg: bool,
    /// Whether this line belongs to a duet partner.
    pub is_duet: bool,
    /// Translated line text, empty when absent.
    pub translated_lyric: String,
    /// Transliterated line text, empty when absent.
    pub roman_lyric: String,
}

/// One timed word within a lyric line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricWord {
    /// Word start, integer milliseconds.
    pub start_time: u64,
    /// Word end, integer milliseconds.
    pub end_time: u64,
    /// The word text.
    pub word: String,
    /// Transliterated word text. Always sent empty.
    pub roman_word: String,
}
