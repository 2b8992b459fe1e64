//! Observable connection status.

use tokio::sync::watch;

/// Coarse connection state of the companion link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// The link is switched off; no connection is maintained.
    #[default]
    Disabled,
    /// A connection attempt is in flight.
    Connecting,
    /// A session is established and frames flow.
    Active,
    /// The last attempt or session ended badly; a retry may be pending.
    Error,
}

/// What a status surface (UI, logs) should show for the link right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Coarse state bucket.
    pub state: LinkState,
    /// Whether work is in flight (an attempt is being made).
    pub busy: bool,
    /// Short human-readable description of the state.
    pub label: String,
}

impl ConnectionStatus {
    /// The link is switched off.
    pub fn disabled() -> Self {
        Self { state: LinkState::Disabled, busy: false, label: "off".to_string() }
    }

    /// An attempt is in flight.
    pub fn connecting() -> Self {
        Self { state: LinkState::Connecting, busy: true, label: "connecting".to_string() }
    }

    /// A session is established.
    pub fn active() -> Self {
        Self { state: LinkState::Active, busy: false, label: "connected".to_string() }
    }

    /// The dial itself failed.
    pub fn connect_error() -> Self {
        Self { state: LinkState::Error, busy: false, label: "connect error".to_string() }
    }

    /// An established or establishing session failed.
    pub fn connection_failed() -> Self {
        Self { state: LinkState::Error, busy: false, label: "connection failed".to_string() }
    }

    /// The peer closed the session.
    pub fn connection_closed() -> Self {
        Self { state: LinkState::Error, busy: false, label: "connection closed".to_string() }
    }

    /// Whether frames may flow right now.
    pub fn is_active(&self) -> bool {
        self.state == LinkState::Active
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Read handle over the link's [`ConnectionStatus`].
///
/// Cheap to clone; every clone observes the same underlying channel.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    rx: watch::Receiver<ConnectionStatus>,
}

impl StatusReporter {
    pub(crate) fn new(rx: watch::Receiver<ConnectionStatus>) -> Self {
        Self { rx }
    }

    /// Copy of the current status.
    pub fn current(&self) -> ConnectionStatus {
        self.rx.borrow().clone()
    }

    /// Wait for the next status change.
    ///
    /// Returns `false` once the link has shut down and no further changes
    /// will arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether frames may flow right now.
    pub fn is_active(&self) -> bool {
        self.rx.borrow().is_active()
    }

    pub(crate) fn receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_surface_strings() {
        assert_eq!(ConnectionStatus::disabled().label, "off");
        assert_eq!(ConnectionStatus::connecting().label, "connecting");
        assert_eq!(ConnectionStatus::active().label, "connected");
        assert_eq!(ConnectionStatus::connect_error().label, "connect error");
        assert_eq!(ConnectionStatus::connection_failed().label, "connection failed");
        assert_eq!(ConnectionStatus::connection_closed().label, "connection closed");
    }

    #[test]
    fn only_connecting_is_busy() {
        assert!(ConnectionStatus::connecting().busy);
        for status in [
            ConnectionStatus::disabled(),
            ConnectionStatus::active(),
            ConnectionStatus::connect_error(),
            ConnectionStatus::connection_failed(),
            ConnectionStatus::connection_closed(),
        ] {
            assert!(!status.busy, "{} should not be busy", status.label);
        }
    }

    #[test]
    fn only_active_allows_traffic() {
        assert!(ConnectionStatus::active().is_active());
        assert!(!ConnectionStatus::connecting().is_active());
        assert!(!ConnectionStatus::connection_closed().is_active());
    }

    #[tokio::test]
    async fn reporter_observes_changes() {
        let (tx, rx) = watch::channel(ConnectionStatus::disabled());
        let mut reporter = StatusReporter::new(rx);
        assert_eq!(reporter.current().label, "off");

        let _ = tx.send_replace(ConnectionStatus::connecting());
        assert!(reporter.changed().await);
        assert_eq!(reporter.current().state, LinkState::Connecting);

        drop(tx);
        assert!(!reporter.changed().await);
    }
}
