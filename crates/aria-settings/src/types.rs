//! Settings schema.

use serde::{Deserialize, Serialize};

/// Root settings document (`~/.aria/settings.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AriaSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name, used in paths and log context.
    pub name: String,
    /// Companion player link settings.
    pub link: LinkSettings,
    /// Logging settings.
    pub log: LogSettings,
}

impl Default for AriaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "aria".to_string(),
            link: LinkSettings::default(),
            log: LogSettings::default(),
        }
    }
}

/// Companion player link settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkSettings {
    /// Whether the link maintains a connection at all.
    pub enabled: bool,
    /// Companion player WebSocket address.
    pub url: String,
    /// Quiet window before a connection retry, in milliseconds.
    pub retry_debounce_ms: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ws://localhost:11444".to_string(),
            retry_debounce_ms: 5000,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogSettings {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}
