//! Outbound state publication.
//!
//! Watches every player state category and turns changes into wire frames.
//! Frames only flow while the link is active; on every transition into
//! active the publisher re-pushes a full snapshot so a freshly connected
//! (or reconnected) companion starts from known-good state.
//!
//! The audio tap is bracketed by the same gate: acquired when the link
//! goes active with a playback backend attached, released when it leaves
//! active, so the player never pays for an encoder nobody is listening to.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

use aria_player::{
    AudioFrame, CoverRef, LyricDoc, PlayState, PlayerControl, StateWatch, TimedLine, TrackInfo,
};
use aria_protocol::{
    clamp_time, AlbumCover, Artist, ImageData, LyricContent, LyricLine, LyricWord, MusicInfo,
    Payload, StateUpdate,
};

use crate::status::ConnectionStatus;
use crate::supervisor::LinkHandle;

/// Task that mirrors player state onto the link.
pub struct StatePublisher {
    watch: StateWatch,
    status: watch::Receiver<ConnectionStatus>,
    outbound: mpsc::Sender<Payload>,
    control: Option<Arc<dyn PlayerControl>>,
    audio: Option<broadcast::Receiver<AudioFrame>>,
    active: bool,
}

impl StatePublisher {
    /// Wire a publisher to a running supervisor.
    pub fn new(
        watch: StateWatch,
        handle: &LinkHandle,
        control: Option<Arc<dyn PlayerControl>>,
    ) -> Self {
        Self {
            watch,
            status: handle.status().receiver(),
            outbound: handle.push_sender(),
            control,
            audio: None,
            active: false,
        }
    }

    /// Run until the supervisor or the player state source goes away.
    pub async fn run(mut self) {
        self.active = self.status.borrow().is_active();
        if self.active {
            self.enter_active();
        }

        loop {
            tokio::select! {
                changed = self.status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let active = self.status.borrow_and_update().is_active();
                    if active && !self.active {
                        self.active = true;
                        self.enter_active();
                    } else if !active && self.active {
                        self.active = false;
                        self.release_audio();
                    }
                }

                changed = self.watch.track.changed() => {
                    if changed.is_err() { break; }
                    let track = self.watch.track.borrow_and_update().clone();
                    self.push(music_update(&track));
                }

                changed = self.watch.cover.changed() => {
                    if changed.is_err() { break; }
                    let cover = self.watch.cover.borrow_and_update().clone();
                    self.push(cover_update(&cover));
                }

                changed = self.watch.lyrics.changed() => {
                    if changed.is_err() { break; }
                    let lyrics = self.watch.lyrics.borrow_and_update().clone();
                    if let Some(update) = lyric_update(&lyrics) {
                        self.push(update);
                    }
                }

                changed = self.watch.progress.changed() => {
                    if changed.is_err() { break; }
                    let progress = *self.watch.progress.borrow_and_update();
                    self.push(StateUpdate::Progress { progress });
                }

                changed = self.watch.volume.changed() => {
                    if changed.is_err() { break; }
                    let volume = *self.watch.volume.borrow_and_update();
                    self.push(StateUpdate::Volume { volume });
                }

                changed = self.watch.playing.changed() => {
                    if changed.is_err() { break; }
                    let playing = *self.watch.playing.borrow_and_update();
                    self.push(play_update(playing));
                }

                received = async {
                    match self.audio.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => match received {
                    Ok(data) => self.push(StateUpdate::AudioData { data }),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "audio tap lagged, frames skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("audio tap closed");
                        self.release_audio();
                    }
                },
            }
        }

        self.release_audio();
        debug!("state publisher stopped");
    }

    /// Transition into active: snapshot everything, start the audio tap.
    fn enter_active(&mut self) {
        debug!("link active, pushing full state snapshot");
        self.push_snapshot();
        if let Some(control) = &self.control {
            if self.audio.is_none() {
                self.audio = Some(control.acquire_audio_data());
            }
        }
    }

    /// Push every category once, marking pending change flags as seen so
    /// the snapshot is not immediately followed by duplicates.
    fn push_snapshot(&mut self) {
        let track = self.watch.track.borrow_and_update().clone();
        self.push(music_update(&track));

        let cover = self.watch.cover.borrow_and_update().clone();
        self.push(cover_update(&cover));

        let lyrics = self.watch.lyrics.borrow_and_update().clone();
        if let Some(update) = lyric_update(&lyrics) {
            self.push(update);
        }

        let progress = *self.watch.progress.borrow_and_update();
        self.push(StateUpdate::Progress { progress });

        let volume = *self.watch.volume.borrow_and_update();
        self.push(StateUpdate::Volume { volume });

        let playing = *self.watch.playing.borrow_and_update();
        self.push(play_update(playing));
    }

    fn release_audio(&mut self) {
        if self.audio.take().is_none() {
            return;
        }
        if let Some(control) = &self.control {
            control.release_audio_data();
        }
    }

    /// Queue one frame, if the link is active. Fire and forget.
    fn push(&self, update: StateUpdate) {
        if !self.active {
            return;
        }
        match self.outbound.try_send(Payload::State(update)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("push queue full, state frame dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("link gone, state frame dropped");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Player state → wire conversions
// ─────────────────────────────────────────────────────────────────────────────

fn music_update(track: &TrackInfo) -> StateUpdate {
    StateUpdate::SetMusic(MusicInfo {
        music_id: track.id.clone(),
        music_name: track.name.clone(),
        album_id: track.album_id.clone(),
        album_name: track.album_name.clone(),
        artists: track
            .artists
            .iter()
            .map(|a| Artist { id: a.id.clone(), name: a.name.clone() })
            .collect(),
        duration: track.duration,
    })
}

fn cover_update(cover: &CoverRef) -> StateUpdate {
    StateUpdate::SetCover(match cover {
        CoverRef::Uri(url) => AlbumCover::Uri { url: url.clone() },
        CoverRef::Data { mime_type, data } => AlbumCover::Data {
            image: ImageData { mime_type: mime_type.clone(), data: data.clone() },
        },
    })
}

fn lyric_update(doc: &LyricDoc) -> Option<StateUpdate> {
    match doc {
        LyricDoc::None => None,
        LyricDoc::Ttml(data) => {
            Some(StateUpdate::SetLyric(LyricContent::Ttml { data: data.clone() }))
        }
        LyricDoc::Structured(lines) => Some(StateUpdate::SetLyric(LyricContent::Structured {
            lines: lines.iter().map(wire_line).collect(),
        })),
    }
}

/// Sanitize one source line for the wire: clamp all timestamps and strip
/// per-word transliterations.
fn wire_line(line: &TimedLine) -> LyricLine {
    LyricLine {
        start_time: clamp_time(line.start_time),
        end_time: clamp_time(line.end_time),
        words: line
            .words
            .iter()
            .map(|w| LyricWord {
                start_time: clamp_time(w.start_time),
                end_time: clamp_time(w.end_time),
                word: w.word.clone(),
                roman_word: String::new(),
            })
            .collect(),
        is_bg: line.is_bg,
        is_duet: line.is_duet,
        translated_lyric: line.translated_lyric.clone(),
        roman_lyric: line.roman_lyric.clone(),
    }
}

fn play_update(playing: PlayState) -> StateUpdate {
    match playing {
        PlayState::Playing => StateUpdate::Resumed,
        PlayState::Paused => StateUpdate::Paused,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
