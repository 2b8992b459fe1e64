//! Playback integration surface.
//!
//! Two seams live here:
//!
//! - [`PlayerControl`]: commands flowing *into* the player (pause, seek,
//!   volume, track skips, audio tap acquisition)
//! - [`StateWatch`] / [`StateFeed`]: playback state flowing *out of* the
//!   player as independently observable categories
//!
//! Both are deliberately backend-agnostic; the link layer only ever sees
//! these types.

#![deny(unsafe_code)]

pub mod control;
pub mod state;

pub use control::{AudioFrame, PlayerControl, PlayerError};
pub use state::{
    state_channel, ArtistInfo, CoverRef, LyricDoc, PlayState, StateFeed, StateSnapshot,
    StateWatch, TimedLine, TimedWord, TrackInfo,
};
