//! Live settings handle for in-process reconfiguration.
//!
//! The link layer reacts to settings changes at runtime (enable, disable,
//! retarget) without a restart. [`SettingsHandle`] owns the write side of a
//! watch channel holding [`LinkSettings`]; every interested task subscribes
//! and awaits changes.

use tokio::sync::watch;

use crate::types::LinkSettings;

/// Owner side of the live link settings.
#[derive(Debug)]
pub struct SettingsHandle {
    tx: watch::Sender<LinkSettings>,
}

impl SettingsHandle {
    /// Create a handle seeded with `initial`.
    pub fn new(initial: LinkSettings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Subscribe to settings changes. The receiver sees the current value
    /// immediately via `borrow`.
    pub fn subscribe(&self) -> watch::Receiver<LinkSettings> {
        self.tx.subscribe()
    }

    /// Read the current value.
    pub fn current(&self) -> LinkSettings {
        self.tx.borrow().clone()
    }

    /// Replace the settings. Subscribers are only notified when the value
    /// actually differs.
    pub fn set(&self, next: LinkSettings) {
        let _ = self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(LinkSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes() {
        let handle = SettingsHandle::default();
        let mut rx = handle.subscribe();

        let mut next = handle.current();
        next.enabled = true;
        handle.set(next);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().enabled);
    }

    #[tokio::test]
    async fn identical_value_does_not_notify() {
        let handle = SettingsHandle::default();
        let mut rx = handle.subscribe();

        handle.set(handle.current());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn current_reflects_last_set() {
        let handle = SettingsHandle::default();
        let mut next = handle.current();
        next.url = "ws://10.0.0.9:11444".to_string();
        handle.set(next.clone());
        assert_eq!(handle.current(), next);
    }
}
