//! Dashboard redraw signal.
//!
//! Consumers key dependent widgets by [`DashboardSignal::key`] and refresh on
//! every publish. `revision` increases on each bump, so two bumps carrying the
//! same key are still distinct tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::SelectOption;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSignal {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub revision: u64,
}

impl DashboardSignal {
    pub fn from_option(option: &SelectOption, revision: u64) -> Self {
        Self {
            key: option.key.clone(),
            label: Some(option.label.clone()),
            revision,
        }
    }

    pub fn keyed(key: impl Into<String>, revision: u64) -> Self {
        Self {
            key: key.into(),
            label: None,
            revision,
        }
    }

    /// Token keyed by wall-clock milliseconds, for refreshes not tied to a selection.
    pub fn timestamp(revision: u64) -> Self {
        Self::keyed(Utc::now().timestamp_millis().to_string(), revision)
    }
}

/// Publishes signal bumps to any number of watchers.
pub struct SignalEmitter {
    tx: watch::Sender<DashboardSignal>,
}

impl SignalEmitter {
    pub fn new(initial: DashboardSignal) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Every publish wakes watchers, even if the content repeats.
    pub fn publish(&self, signal: DashboardSignal) {
        self.tx.send_replace(signal);
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSignal> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> DashboardSignal {
        self.tx.borrow().clone()
    }
}

impl Default for SignalEmitter {
    fn default() -> Self {
        Self::new(DashboardSignal::default())
    }
}
