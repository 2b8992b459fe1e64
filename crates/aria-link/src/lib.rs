//! # aria-link
//!
//! Bidirectional sync with a companion lyric/player app over WebSocket.
//!
//! The crate is built from four pieces, each owning one concern:
//!
//! - [`LinkSupervisor`] — connection lifecycle: epoch-tagged attempts,
//!   trailing-edge retry debounce, inbound dispatch, outbound gating
//! - [`StatePublisher`] — mirrors player state categories onto the wire
//!   and brackets the audio tap around the active window
//! - [`Connector`] — the transport seam; [`WsConnector`] is the real one
//! - [`StatusReporter`] — observable `{state, busy, label}` for surfaces
//!
//! [`CompanionLink`] wires them together for the common case:
//!
//! ```no_run
//! use std::sync::Arc;
//! use aria_link::CompanionLink;
//! use aria_player::state_channel;
//! use aria_settings::SettingsHandle;
//!
//! # async fn demo() {
//! let (feed, watch) = state_channel();
//! let settings = SettingsHandle::new(aria_settings::get_settings().link.clone());
//! let link = CompanionLink::spawn_ws(None, watch, settings.subscribe());
//! // ... feed player state, flip settings, observe link.status() ...
//! link.shutdown().await;
//! # }
//! ```

#![deny(unsafe_code)]

pub mod connector;
pub mod dispatcher;
pub mod publisher;
pub mod status;
pub mod supervisor;

pub use connector::{Connector, TaggedEvent, TransportEvent, TransportHandle, WsConnector};
pub use publisher::StatePublisher;
pub use status::{ConnectionStatus, LinkState, StatusReporter};
pub use supervisor::{LinkHandle, LinkSupervisor};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use aria_player::{PlayerControl, StateWatch};
use aria_settings::LinkSettings;

/// How long shutdown waits for the link tasks to stop.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A fully wired companion link: supervisor plus publisher.
pub struct CompanionLink {
    handle: LinkHandle,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl CompanionLink {
    /// Spawn the link over an arbitrary [`Connector`].
    pub fn spawn(
        connector: Arc<dyn Connector>,
        control: Option<Arc<dyn PlayerControl>>,
        state: StateWatch,
        settings: watch::Receiver<LinkSettings>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (handle, supervisor_task) =
            LinkSupervisor::spawn(connector, control.clone(), settings, cancel.clone());
        let publisher = StatePublisher::new(state, &handle, control);
        let publisher_task = tokio::spawn(publisher.run());
        Self {
            handle,
            cancel,
            tasks: vec![supervisor_task, publisher_task],
        }
    }

    /// Spawn the link over the production WebSocket connector.
    pub fn spawn_ws(
        control: Option<Arc<dyn PlayerControl>>,
        state: StateWatch,
        settings: watch::Receiver<LinkSettings>,
    ) -> Self {
        Self::spawn(Arc::new(WsConnector), control, state, settings)
    }

    /// Observe the link's connection status.
    pub fn status(&self) -> StatusReporter {
        self.handle.status()
    }

    /// Handle to the running supervisor.
    pub fn handle(&self) -> LinkHandle {
        self.handle.clone()
    }

    /// Stop the link and wait for its tasks to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "link task ended abnormally"),
                Err(_) => warn!("link task did not stop within the shutdown window"),
            }
        }
    }
}
