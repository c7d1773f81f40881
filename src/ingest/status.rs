//! Catalog readiness register
//!
//! Tri-state flag consulted by request handlers to decide between serving
//! content, a waiting page or an unavailable response. The value lives in a
//! `watch` channel: writes replace it atomically, reads copy it out, and the
//! refresh scheduler can await a change instead of polling.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

use super::orchestrator::IngestError;

/// Readiness of the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// An ingestion run is in flight
    #[default]
    Loading,
    /// Last run fetched every collection
    Loaded,
    /// Last run reported at least one error
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Flag-triple view of a [`Status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingStatus {
    pub is_loading: bool,
    pub is_loaded: bool,
    pub has_failed: bool,
}

impl Status {
    /// Status from a flag triple; `None` unless exactly one flag is set
    pub fn from_flags(loading: bool, loaded: bool, failed: bool) -> Option<Self> {
        match (loading, loaded, failed) {
            (true, false, false) => Some(Self::Loading),
            (false, true, false) => Some(Self::Loaded),
            (false, false, true) => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn flags(&self) -> LoadingStatus {
        LoadingStatus {
            is_loading: *self == Self::Loading,
            is_loaded: *self == Self::Loaded,
            has_failed: *self == Self::Failed,
        }
    }

    /// Outcome of an ingestion run: any error at all means Failed
    pub fn from_errors(errors: &[IngestError]) -> Self {
        if errors.is_empty() {
            Self::Loaded
        } else {
            Self::Failed
        }
    }
}

/// Shared status register, starts in [`Status::Loading`]
#[derive(Debug)]
pub struct StatusRegister {
    tx: watch::Sender<Status>,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Status::Loading);
        Self { tx }
    }

    /// Current status
    pub fn status(&self) -> Status {
        *self.tx.borrow()
    }

    pub fn get_status(&self) -> Status {
        self.status()
    }

    /// Overwrite the status
    pub fn set(&self, status: Status) {
        let previous = self.tx.send_replace(status);
        if previous != status {
            tracing::debug!(from = %previous, to = %status, "Status changed");
        }
    }

    /// Switch to Loading unless a run is already in flight
    ///
    /// Check and write happen under the channel lock, so of two callers
    /// racing here exactly one gets `true`.
    pub fn try_begin_loading(&self) -> bool {
        let started = self.tx.send_if_modified(|status| {
            if *status == Status::Loading {
                false
            } else {
                *status = Status::Loading;
                true
            }
        });
        if started {
            tracing::debug!(to = %Status::Loading, "Status changed");
        }
        started
    }

    /// Overwrite the status from a flag triple.
    ///
    /// Returns `false` and leaves the register untouched unless exactly one
    /// flag is set.
    pub fn set_status(&self, loading: bool, loaded: bool, failed: bool) -> bool {
        match Status::from_flags(loading, loaded, failed) {
            Some(status) => {
                self.set(status);
                true
            }
            None => {
                tracing::warn!(
                    loading = loading,
                    loaded = loaded,
                    failed = failed,
                    "Rejected inconsistent status flags"
                );
                false
            }
        }
    }

    /// Flag-triple view of the current status
    pub fn flags(&self) -> LoadingStatus {
        self.status().flags()
    }

    /// Receiver notified on every status write
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }
}
