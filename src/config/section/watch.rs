//! `[watch]` section configuration.
//!
//! Controls the filesystem monitor that triggers reloads on file changes.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! enable = true               # Start the monitor
//! binary = "watchexec"        # External watcher executable
//! debounce_ms = 200           # 0 = watcher default
//! notify_timeout_secs = 10    # Timeout of reload requests sent to fzf
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::config::error::ConfigDiagnostics;

/// Filesystem monitor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub enable: bool,
    pub binary: String,
    pub debounce_ms: u64,
    pub notify_timeout_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enable: true,
            binary: "watchexec".into(),
            debounce_ms: 0,
            notify_timeout_secs: 10,
        }
    }
}

impl WatchConfig {
    /// Debounce window passed to the watcher, if not left to its default.
    pub fn debounce(&self) -> Option<Duration> {
        (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms))
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.notify_timeout_secs == 0 {
            diag.error_with_hint(
                "watch.notify_timeout_secs",
                "must be greater than 0",
                "omit the field to use the default of 10 seconds",
            );
        }
    }
}
