//! Transport seam and the production WebSocket connector.
//!
//! The supervisor never touches sockets directly. It asks a [`Connector`]
//! to begin an attempt and then consumes [`TransportEvent`]s tagged with
//! the attempt's epoch. Because every event carries its epoch, a late
//! event from a superseded socket is recognizable and ignorable, no matter
//! how the tasks interleave.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use aria_protocol::Frame;

/// Something a live transport reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The session is established; frames may flow.
    Opened,
    /// The dial itself failed; no session ever existed.
    OpenFailed(String),
    /// A frame arrived from the companion.
    Message(Frame),
    /// An established session failed.
    Errored(String),
    /// The peer closed the session.
    Closed,
}

/// A transport event plus the epoch of the attempt that produced it.
pub type TaggedEvent = (u64, TransportEvent);

/// Write/teardown handle for one connection attempt.
///
/// Dropping the handle tears the attempt down.
#[derive(Debug)]
pub struct TransportHandle {
    outbound: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl TransportHandle {
    /// Build a handle from the attempt's outbound queue and cancel token.
    pub fn new(outbound: mpsc::Sender<String>, cancel: CancellationToken) -> Self {
        Self { outbound, cancel }
    }

    /// Queue an encoded frame for sending. Returns `false` if the queue is
    /// full or the transport is gone; the frame is dropped either way.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.try_send(frame).is_ok()
    }

    /// Tear the attempt down. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Opens transports toward the companion player.
pub trait Connector: Send + Sync + 'static {
    /// Begin a connection attempt to `url`.
    ///
    /// All outcomes, including dial failure, are delivered on `events`
    /// tagged with `epoch`. The returned handle queues outbound frames and
    /// tears the attempt down.
    fn connect(&self, url: &str, epoch: u64, events: mpsc::Sender<TaggedEvent>)
        -> TransportHandle;
}

/// Outbound queue depth per connection attempt.
const OUTBOUND_QUEUE: usize = 64;

/// Production [`Connector`] over `tokio-tungstenite`.
#[derive(Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(
        &self,
        url: &str,
        epoch: u64,
        events: mpsc::Sender<TaggedEvent>,
    ) -> TransportHandle {
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let cancel = CancellationToken::new();
        let _ = tokio::spawn(run_ws(url.to_string(), epoch, events, out_rx, cancel.clone()));
        TransportHandle::new(out_tx, cancel)
    }
}

/// Drive one WebSocket session end to end.
async fn run_ws(
    url: String,
    epoch: u64,
    events: mpsc::Sender<TaggedEvent>,
    mut outbound: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    debug!(%url, epoch, "dialing companion player");
    let dial = tokio::select! {
        () = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };

    let socket = match dial {
        Ok((socket, _response)) => socket,
        Err(e) => {
            debug!(%url, epoch, error = %e, "dial failed");
            let _ = events.send((epoch, TransportEvent::OpenFailed(e.to_string()))).await;
            return;
        }
    };

    debug!(%url, epoch, "session established");
    let (mut sink, mut stream) = socket.split();
    let _ = events.send((epoch, TransportEvent::Opened)).await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.close().await;
                return;
            }
            queued = outbound.recv() => match queued {
                Some(text) => {
                    if let Err(e) = sink.send(WsMessage::text(text)).await {
                        warn!(epoch, error = %e, "send failed, frame dropped");
                    }
                }
                None => {
                    let _ = sink.close().await;
                    return;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let frame = Frame::Text(text.as_str().to_owned());
                    let _ = events.send((epoch, TransportEvent::Message(frame))).await;
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    let frame = Frame::Binary(bytes.to_vec());
                    let _ = events.send((epoch, TransportEvent::Message(frame))).await;
                }
                // tungstenite answers protocol pings internally.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Ok(WsMessage::Close(_))) | None => {
                    let _ = events.send((epoch, TransportEvent::Closed)).await;
                    return;
                }
                Some(Err(e)) => {
                    let _ = events
                        .send((epoch, TransportEvent::Errored(e.to_string())))
                        .await;
                    return;
                }
            },
        }
    }
}
