//! End-to-end flow through the fully wired link: supervisor, publisher,
//! dispatch, and status reporting over a scripted transport.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use aria_link::{CompanionLink, Connector, TaggedEvent, TransportEvent, TransportHandle};
use aria_player::{state_channel, AudioFrame, PlayState, PlayerControl, PlayerError, TrackInfo};
use aria_protocol::Frame;
use aria_settings::{LinkSettings, SettingsHandle};

struct Attempt {
    epoch: u64,
    events: mpsc::Sender<TaggedEvent>,
    outbound: Option<mpsc::Receiver<String>>,
}

#[derive(Default)]
struct ScriptedConnector {
    attempts: Mutex<Vec<Attempt>>,
}

impl ScriptedConnector {
    fn count(&self) -> usize {
        self.attempts.lock().len()
    }

    fn take_outbound(&self, i: usize) -> mpsc::Receiver<String> {
        self.attempts.lock()[i].outbound.take().unwrap()
    }

    async fn emit(&self, i: usize, event: TransportEvent) {
        let (epoch, events) = {
            let attempts = self.attempts.lock();
            (attempts[i].epoch, attempts[i].events.clone())
        };
        events.send((epoch, event)).await.unwrap();
    }
}

impl Connector for ScriptedConnector {
    fn connect(
        &self,
        _url: &str,
        epoch: u64,
        events: mpsc::Sender<TaggedEvent>,
    ) -> TransportHandle {
        let (out_tx, out_rx) = mpsc::channel(64);
        self.attempts.lock().push(Attempt {
            epoch,
            events,
            outbound: Some(out_rx),
        });
        TransportHandle::new(out_tx, CancellationToken::new())
    }
}

struct ScriptedPlayer {
    seeks: Mutex<Vec<f64>>,
    taps: Mutex<i32>,
    audio_tx: broadcast::Sender<AudioFrame>,
}

impl ScriptedPlayer {
    fn new() -> Self {
        let (audio_tx, _) = broadcast::channel(16);
        Self { seeks: Mutex::new(Vec::new()), taps: Mutex::new(0), audio_tx }
    }
}

#[async_trait]
impl PlayerControl for ScriptedPlayer {
    async fn pause(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    async fn resume(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    async fn next_track(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    async fn previous_track(&self) -> Result<(), PlayerError> {
        Ok(())
    }
    async fn set_volume(&self, _volume: f64) -> Result<(), PlayerError> {
        Ok(())
    }
    async fn seek_to(&self, progress: f64) -> Result<(), PlayerError> {
        self.seeks.lock().push(progress);
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

async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

fn parse(frame: &str) -> Value {
    serde_json::from_str(frame).unwrap()
}

fn drain(out: &mut mpsc::Receiver<String>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = out.try_recv() {
        frames.push(parse(&frame));
    }
    frames
}

#[tokio::test]
async fn full_session_round_trip() {
    let connector = Arc::new(ScriptedConnector::default());
    let player = Arc::new(ScriptedPlayer::new());
    let (feed, state_watch) = state_channel();
    let settings = SettingsHandle::new(LinkSettings {
        enabled: true,
        url: "ws://companion.test:11444".to_string(),
        retry_debounce_ms: 5000,
    });

    let link = CompanionLink::spawn(
        connector.clone(),
        Some(player.clone()),
        state_watch,
        settings.subscribe(),
    );
    settle().await;

    // Enabled settings dial immediately.
    assert_eq!(connector.count(), 1);
    assert_eq!(link.status().current().label, "connecting");

    feed.set_track(TrackInfo {
        id: "t1".into(),
        name: "Aubade".into(),
        album_id: "a1".into(),
        album_name: "Dawn".into(),
        artists: Vec::new(),
        duration: 183_000.0,
    });
    feed.set_volume(0.8);
    settle().await;

    let mut out = connector.take_outbound(0);
    connector.emit(0, TransportEvent::Opened).await;
    settle().await;

    assert_eq!(link.status().current().label, "connected");
    assert_eq!(*player.taps.lock(), 1, "audio tap acquired on activation");

    // initialize first, then the full snapshot.
    let frames = drain(&mut out);
    assert_eq!(frames[0], json!({"type": "initialize"}));
    let updates: Vec<&str> = frames[1..]
        .iter()
        .map(|f| f["value"]["update"].as_str().unwrap())
        .collect();
    assert_eq!(updates, ["setMusic", "setCover", "progress", "volume", "paused"]);
    assert_eq!(frames[1]["value"]["musicName"], "Aubade");
    assert_eq!(frames[4]["value"]["volume"], 0.8);

    // Companion liveness probe.
    connector
        .emit(0, TransportEvent::Message(Frame::Text(r#"{"type":"ping"}"#.into())))
        .await;
    settle().await;
    assert_eq!(drain(&mut out), vec![json!({"type": "pong"})]);

    // Remote command lands on the player exactly once.
    let seek = r#"{"type":"command","value":{"command":"seekPlayProgress","progress":42000.0}}"#;
    connector
        .emit(0, TransportEvent::Message(Frame::Text(seek.into())))
        .await;
    settle().await;
    assert_eq!(*player.seeks.lock(), vec![42_000.0]);

    // Live state changes stream out per category.
    feed.set_playing(PlayState::Playing);
    feed.set_progress(43_000.0);
    settle().await;
    let frames = drain(&mut out);
    assert_eq!(frames[0]["value"]["update"], "resumed");
    assert_eq!(frames[1]["value"]["progress"], 43_000.0);

    // Audio tap frames ride the same pipe.
    let _ = player.audio_tx.send(vec![1, 2, 3]);
    settle().await;
    let frames = drain(&mut out);
    assert_eq!(frames[0]["value"]["update"], "audioData");
    assert_eq!(frames[0]["value"]["data"], json!([1, 2, 3]));

    // Peer closing the session releases the tap and mutes pushes.
    connector.emit(0, TransportEvent::Closed).await;
    settle().await;
    assert_eq!(link.status().current().label, "connection closed");
    assert_eq!(*player.taps.lock(), 0, "audio tap released on deactivation");

    feed.set_volume(0.2);
    settle().await;

    // Disabling wins over the pending retry.
    let mut off = settings.current();
    off.enabled = false;
    settings.set(off);
    settle().await;
    assert_eq!(link.status().current().label, "off");
    assert_eq!(connector.count(), 1);

    link.shutdown().await;
}

#[tokio::test]
async fn status_changes_are_observable() {
    let connector = Arc::new(ScriptedConnector::default());
    let (_feed, state_watch) = state_channel();
    let settings = SettingsHandle::new(LinkSettings::default());

    let link = CompanionLink::spawn(connector.clone(), None, state_watch, settings.subscribe());
    let mut status = link.status();
    settle().await;
    assert_eq!(status.current().label, "off");

    let mut on = settings.current();
    on.enabled = true;
    settings.set(on);

    assert!(status.changed().await);
    let current = status.current();
    assert_eq!(current.label, "connecting");
    assert!(current.busy);

    connector.emit(0, TransportEvent::Opened).await;
    assert!(status.changed().await);
    assert!(status.is_active());

    link.shutdown().await;
}
