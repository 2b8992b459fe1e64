//! Command seam into the playback backend.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// One chunk of raw audio bytes from the player's output tap.
pub type AudioFrame = Vec<u8>;

/// Errors a playback backend may report for a rejected request.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The backend refused or failed the operation.
    #[error("playback backend error: {0}")]
    Backend(String),
    /// No track is loaded, so the operation has no target.
    #[error("no track is loaded")]
    NoTrack,
}

/// Commands the link layer can issue against the playback backend.
///
/// Implementations must be cheap to call concurrently; the link layer
/// issues at most one call per received command frame and never retries.
#[async_trait]
pub trait PlayerControl: Send + Sync {
    /// Halt playback, keeping the current position.
    async fn pause(&self) -> Result<(), PlayerError>;

    /// Resume playback from the current position.
    async fn resume(&self) -> Result<(), PlayerError>;

    /// Skip to the next track in the queue.
    async fn next_track(&self) -> Result<(), PlayerError>;

    /// Return to the previous track in the queue.
    async fn previous_track(&self) -> Result<(), PlayerError>;

    /// Set the output volume, nominally in `[0, 1]`.
    async fn set_volume(&self, volume: f64) -> Result<(), PlayerError>;

    /// Seek to an absolute position in milliseconds.
    async fn seek_to(&self, progress: f64) -> Result<(), PlayerError>;

    /// Start the audio output tap and subscribe to its frames.
    ///
    /// Each call must be balanced by one [`PlayerControl::release_audio_data`]
    /// once the subscription is no longer needed.
    fn acquire_audio_data(&self) -> broadcast::Receiver<AudioFrame>;

    /// Balance a prior [`PlayerControl::acquire_audio_data`] call.
    fn release_audio_data(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct CountingPlayer {
        taps: Mutex<i32>,
        audio_tx: broadcast::Sender<AudioFrame>,
    }

    #[async_trait]
    impl PlayerControl for CountingPlayer {
        async fn pause(&self) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn resume(&self) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn next_track(&self) -> Result<(), PlayerError> {
            Err(PlayerError::NoTrack)
        }
        async fn previous_track(&self) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn set_volume(&self, _volume: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn seek_to(&self, _progress: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        fn acquire_audio_data(&self) -> broadcast::Receiver<AudioFrame> {
            *self.taps.lock() += 1;
            self.audio_tx.subscribe()
        }
        fn release_audio_data(&self) {
            *self.taps.lock() -= 1;
        }
    }

    #[tokio::test]
    async fn trait_object_is_usable_behind_arc() {
        let (audio_tx, _) = broadcast::channel(4);
        let player: Arc<dyn PlayerControl> =
            Arc::new(CountingPlayer { taps: Mutex::new(0), audio_tx });

        player.pause().await.unwrap();
        assert!(matches!(player.next_track().await, Err(PlayerError::NoTrack)));
    }

    #[tokio::test]
    async fn audio_tap_delivers_frames_while_held() {
        let (audio_tx, _) = broadcast::channel(4);
        let player = CountingPlayer { taps: Mutex::new(0), audio_tx: audio_tx.clone() };

        let mut rx = player.acquire_audio_data();
        assert_eq!(*player.taps.lock(), 1);

        let _ = audio_tx.send(vec![1, 2, 3]);
        assert_eq!(rx.recv().await.unwrap(), vec![1, 2, 3]);

        player.release_audio_data();
        assert_eq!(*player.taps.lock(), 0);
    }
}
