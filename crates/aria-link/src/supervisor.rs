//! Connection supervision state machine.
//!
//! One task owns the whole lifecycle: settings changes, connection
//! attempts, retry scheduling, inbound dispatch, and outbound gating all
//! funnel through a single `select!` loop, so there is never a lock to
//! take or a race to reason about.
//!
//! Two rules keep reconnection sane:
//!
//! - **Epochs.** Every attempt gets a fresh epoch, and every transport
//!   event carries the epoch of the attempt that produced it. An event
//!   whose epoch is not current is from a superseded attempt and is
//!   ignored outright.
//! - **Trailing-edge retry.** A failure arms a retry timer; another
//!   failure before it fires re-arms it. The link reconnects only after a
//!   full quiet window, no matter how many errors arrive in a burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aria_player::PlayerControl;
use aria_protocol::{codec, Frame, Payload};
use aria_settings::LinkSettings;

use crate::connector::{Connector, TaggedEvent, TransportEvent, TransportHandle};
use crate::dispatcher;
use crate::status::{ConnectionStatus, StatusReporter};

/// Depth of the transport event queue shared by all attempts.
const EVENT_QUEUE: usize = 256;

/// Depth of the state push queue feeding the supervisor.
const PUSH_QUEUE: usize = 64;

/// Caller-facing handle to a running supervisor.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    push: mpsc::Sender<Payload>,
    status: StatusReporter,
}

impl LinkHandle {
    /// Observe the link's connection status.
    pub fn status(&self) -> StatusReporter {
        self.status.clone()
    }

    /// Sender for outbound state pushes. Frames are dropped unless the
    /// link is active.
    pub fn push_sender(&self) -> mpsc::Sender<Payload> {
        self.push.clone()
    }
}

/// The supervision task. Construct with [`LinkSupervisor::spawn`].
pub struct LinkSupervisor {
    connector: Arc<dyn Connector>,
    control: Option<Arc<dyn PlayerControl>>,
    settings: watch::Receiver<LinkSettings>,
    settings_open: bool,
    status_tx: watch::Sender<ConnectionStatus>,
    events_tx: mpsc::Sender<TaggedEvent>,
    events_rx: mpsc::Receiver<TaggedEvent>,
    push_rx: mpsc::Receiver<Payload>,
    push_open: bool,
    cancel: CancellationToken,
    epoch: u64,
    transport: Option<TransportHandle>,
    retry_at: Option<Instant>,
    debounce: Duration,
    url: String,
}

impl LinkSupervisor {
    /// Start a supervisor task and return its handle.
    ///
    /// The task runs until `cancel` fires. `control` is optional so the
    /// link can run headless (commands are then dropped).
    pub fn spawn(
        connector: Arc<dyn Connector>,
        control: Option<Arc<dyn PlayerControl>>,
        settings: watch::Receiver<LinkSettings>,
        cancel: CancellationToken,
    ) -> (LinkHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let (push_tx, push_rx) = mpsc::channel(PUSH_QUEUE);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::disabled());

        let supervisor = Self {
            connector,
            control,
            settings,
            settings_open: true,
            status_tx,
            events_tx,
            events_rx,
            push_rx,
            push_open: true,
            cancel,
            epoch: 0,
            transport: None,
            retry_at: None,
            debounce: Duration::from_millis(LinkSettings::default().retry_debounce_ms),
            url: String::new(),
        };

        let handle = LinkHandle {
            push: push_tx,
            status: StatusReporter::new(status_rx),
        };
        let task = tokio::spawn(supervisor.run());
        (handle, task)
    }

    async fn run(mut self) {
        self.apply_settings();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,

                changed = self.settings.changed(), if self.settings_open => {
                    if changed.is_ok() {
                        self.apply_settings();
                    } else {
                        debug!("settings source gone, keeping last configuration");
                        self.settings_open = false;
                    }
                }

                event = self.events_rx.recv() => {
                    if let Some((epoch, event)) = event {
                        self.on_transport_event(epoch, event).await;
                    }
                }

                pushed = self.push_rx.recv(), if self.push_open => {
                    match pushed {
                        Some(payload) => self.push_if_active(&payload),
                        None => self.push_open = false,
                    }
                }

                () = async {
                    match self.retry_at {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.retry_at = None;
                    info!(url = %self.url, "retry window elapsed, reconnecting");
                    self.begin_connect();
                }
            }
        }

        self.transport = None;
        self.set_status(ConnectionStatus::disabled());
        debug!("link supervisor stopped");
    }

    /// Re-read settings and converge on them. Enabling (or any change
    /// while enabled) starts a fresh attempt; disabling tears everything
    /// down, including a pending retry.
    fn apply_settings(&mut self) {
        let link = self.settings.borrow_and_update().clone();
        self.debounce = Duration::from_millis(link.retry_debounce_ms);
        if link.enabled {
            self.url = link.url;
            info!(url = %self.url, "link configuration applied, connecting");
            self.begin_connect();
        } else {
            self.disable();
        }
    }

    /// Start a fresh attempt under a new epoch, superseding whatever came
    /// before it.
    fn begin_connect(&mut self) {
        self.retry_at = None;
        self.epoch += 1;
        self.transport = None;
        self.set_status(ConnectionStatus::connecting());
        let handle = self
            .connector
            .connect(&self.url, self.epoch, self.events_tx.clone());
        self.transport = Some(handle);
    }

    /// Tear down to the off state. Safe to call from any state.
    fn disable(&mut self) {
        self.retry_at = None;
        self.epoch += 1;
        self.transport = None;
        self.set_status(ConnectionStatus::disabled());
        debug!("link disabled");
    }

    async fn on_transport_event(&mut self, epoch: u64, event: TransportEvent) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "event from superseded attempt, ignored");
            return;
        }
        match event {
            TransportEvent::Opened => {
                info!(url = %self.url, "companion link established");
                self.set_status(ConnectionStatus::active());
                self.send_now(&Payload::Initialize);
            }
            TransportEvent::OpenFailed(e) => {
                warn!(url = %self.url, error = %e, "companion dial failed");
                self.fail(ConnectionStatus::connect_error());
            }
            TransportEvent::Errored(e) => {
                warn!(url = %self.url, error = %e, "companion link failed");
                self.fail(ConnectionStatus::connection_failed());
            }
            TransportEvent::Closed => {
                info!(url = %self.url, "companion closed the link");
                self.fail(ConnectionStatus::connection_closed());
            }
            TransportEvent::Message(frame) => self.on_frame(frame).await,
        }
    }

    /// Record a failure and (re-)arm the retry timer.
    fn fail(&mut self, status: ConnectionStatus) {
        self.transport = None;
        self.set_status(status);
        self.retry_at = Some(Instant::now() + self.debounce);
        debug!(debounce = ?self.debounce, "retry armed");
    }

    async fn on_frame(&mut self, frame: Frame) {
        let payload = match codec::decode_frame(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "undecodable frame dropped");
                return;
            }
        };
        if let Some(reply) = dispatcher::dispatch(payload, self.control.as_deref()).await {
            self.send_now(&reply);
        }
    }

    /// Forward a state push to the wire, but only while active.
    fn push_if_active(&self, payload: &Payload) {
        if self.status_tx.borrow().is_active() {
            self.send_now(payload);
        } else {
            debug!("link not active, state push dropped");
        }
    }

    /// Encode and queue a frame on the current transport. Failures are
    /// logged and the frame is dropped; nothing here is retried.
    fn send_now(&self, payload: &Payload) {
        let Some(transport) = &self.transport else {
            return;
        };
        match codec::encode(payload) {
            Ok(text) => {
                if !transport.send(text) {
                    warn!("outbound queue full, frame dropped");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode frame"),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        let _ = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
