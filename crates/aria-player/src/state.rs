//! Observable playback state, split into independent categories.
//!
//! The player side holds a [`StateFeed`] and writes into it whenever its
//! state moves; observers hold a [`StateWatch`] and await changes per
//! category. Categories are independent watch channels so a progress tick
//! never forces re-examining track metadata.

use tokio::sync::watch;

/// Host-side metadata for the loaded track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackInfo {
    /// Stable track identifier.
    pub id: String,
    /// Display name of the track.
    pub name: String,
    /// Stable album identifier.
    pub album_id: String,
    /// Display name of the album.
    pub album_name: String,
    /// Credited artists, in display order.
    pub artists: Vec<ArtistInfo>,
    /// Track length in milliseconds.
    pub duration: f64,
}

/// One credited artist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtistInfo {
    /// Stable artist identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Where the current album cover lives.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverRef {
    /// Cover addressed by URI.
    Uri(String),
    /// Cover held in memory.
    Data {
        /// MIME type, e.g. `image/jpeg`.
        mime_type: String,
        /// Base64-encoded image bytes.
        data: String,
    },
}

impl Default for CoverRef {
    fn default() -> Self {
        CoverRef::Uri(String::new())
    }
}

/// A timed word as the lyric source provides it, fractional times and all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimedWord {
    /// Word start in milliseconds. May be negative or non-finite.
    pub start_time: f64,
    /// Word end in milliseconds. May be negative or non-finite.
    pub end_time: f64,
    /// The word text.
    pub word: String,
    /// Transliterated word text.
    pub roman_word: String,
}

/// A timed line as the lyric source provides it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimedLine {
    /// Line start in milliseconds. May be negative or non-finite.
    pub start_time: f64,
    /// Line end in milliseconds. May be negative or non-finite.
    pub end_time: f64,
    /// Timed words making up the line.
    pub words: Vec<TimedWord>,
    /// Whether this is a background vocal line.
    pub is_bg: bool,
    /// Whether this line belongs to a duet partner.
    pub is_duet: bool,
    /// Translated line text, empty when absent.
    pub translated_lyric: String,
    /// Transliterated line text, empty when absent.
    pub roman_lyric: String,
}

/// The lyric document currently loaded, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LyricDoc {
    /// No lyrics available for the current track.
    #[default]
    None,
    /// Line/word timing structure.
    Structured(Vec<TimedLine>),
    /// Raw TTML document.
    Ttml(String),
}

/// Whether playback is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Playback is halted.
    #[default]
    Paused,
    /// Playback is running.
    Playing,
}

/// A point-in-time copy of every category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateSnapshot {
    /// Loaded track metadata.
    pub track: TrackInfo,
    /// Current album cover.
    pub cover: CoverRef,
    /// Current lyric document.
    pub lyrics: LyricDoc,
    /// Playback position in milliseconds.
    pub progress: f64,
    /// Output volume in `[0, 1]`.
    pub volume: f64,
    /// Whether playback is running.
    pub playing: PlayState,
}

/// Write half held by the player.
#[derive(Debug)]
pub struct StateFeed {
    track: watch::Sender<TrackInfo>,
    cover: watch::Sender<CoverRef>,
    lyrics: watch::Sender<LyricDoc>,
    progress: watch::Sender<f64>,
    volume: watch::Sender<f64>,
    playing: watch::Sender<PlayState>,
}

/// Read half held by observers.
#[derive(Debug, Clone)]
pub struct StateWatch {
    /// Track metadata changes.
    pub track: watch::Receiver<TrackInfo>,
    /// Album cover changes.
    pub cover: watch::Receiver<CoverRef>,
    /// Lyric document changes.
    pub lyrics: watch::Receiver<LyricDoc>,
    /// Position changes.
    pub progress: watch::Receiver<f64>,
    /// Volume changes.
    pub volume: watch::Receiver<f64>,
    /// Play/pause changes.
    pub playing: watch::Receiver<PlayState>,
}

/// Create a connected feed/watch pair with default-valued categories.
pub fn state_channel() -> (StateFeed, StateWatch) {
    let (track_tx, track_rx) = watch::channel(TrackInfo::default());
    let (cover_tx, cover_rx) = watch::channel(CoverRef::default());
    let (lyrics_tx, lyrics_rx) = watch::channel(LyricDoc::default());
    let (progress_tx, progress_rx) = watch::channel(0.0);
    let (volume_tx, volume_rx) = watch::channel(1.0);
    let (playing_tx, playing_rx) = watch::channel(PlayState::default());
    (
        StateFeed {
            track: track_tx,
            cover: cover_tx,
            lyrics: lyrics_tx,
            progress: progress_tx,
            volume: volume_tx,
            playing: playing_tx,
        },
        StateWatch {
            track: track_rx,
            cover: cover_rx,
            lyrics: lyrics_rx,
            progress: progress_rx,
            volume: volume_rx,
            playing: playing_rx,
        },
    )
}

impl StateFeed {
    /// Publish new track metadata.
    pub fn set_track(&self, track: TrackInfo) {
        let _ = self.track.send_replace(track);
    }

    /// Publish a new album cover.
    pub fn set_cover(&self, cover: CoverRef) {
        let _ = self.cover.send_replace(cover);
    }

    /// Publish a new lyric document.
    pub fn set_lyrics(&self, lyrics: LyricDoc) {
        let _ = self.lyrics.send_replace(lyrics);
    }

    /// Publish the playback position in milliseconds.
    pub fn set_progress(&self, progress: f64) {
        let _ = self.progress.send_replace(progress);
    }

    /// Publish the output volume.
    pub fn set_volume(&self, volume: f64) {
        let _ = self.volume.send_replace(volume);
    }

    /// Publish the play/pause state.
    pub fn set_playing(&self, playing: PlayState) {
        let _ = self.playing.send_replace(playing);
    }
}

impl StateWatch {
    /// Copy the current value of every category.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            track: self.track.borrow().clone(),
            cover: self.cover.borrow().clone(),
            lyrics: self.lyrics.borrow().clone(),
            progress: *self.progress.borrow(),
            volume: *self.volume.borrow(),
            playing: *self.playing.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn categories_change_independently() {
        let (feed, mut watch) = state_channel();

        feed.set_progress(1500.0);
        watch.progress.changed().await.unwrap();
        assert_eq!(*watch.progress.borrow_and_update(), 1500.0);

        // No other category was marked changed.
        assert!(!watch.track.has_changed().unwrap());
        assert!(!watch.volume.has_changed().unwrap());
    }

    #[tokio::test]
    async fn snapshot_reflects_latest_values() {
        let (feed, watch) = state_channel();

        feed.set_track(TrackInfo { name: "Aubade".into(), ..TrackInfo::default() });
        feed.set_playing(PlayState::Playing);
        feed.set_volume(0.4);

        let snap = watch.snapshot();
        assert_eq!(snap.track.name, "Aubade");
        assert_eq!(snap.playing, PlayState::Playing);
        assert_eq!(snap.volume, 0.4);
        assert_eq!(snap.lyrics, LyricDoc::None);
    }

    #[tokio::test]
    async fn updates_survive_with_no_watchers() {
        let (feed, watch) = state_channel();
        drop(watch);
        // send_replace never fails, and later subscribers see the value.
        feed.set_volume(0.1);
    }
}
