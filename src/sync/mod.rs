//! Sync loop subsystem.
//!
//! # Data Flow
//! ```text
//! Topology update (change feed) or resync tick
//!     → state::generate_state (old snapshot read-only, new snapshot owned)
//!     → StateApplier::apply (one transaction, retried with backoff)
//!     → on commit: new snapshot published through SyncHandle
//! ```
//!
//! # Design Decisions
//! - One pass at a time; upstreams within a pass are processed sequentially
//! - Only committed snapshots are published; a failed apply keeps the old one
//! - Bursts of updates collapse to the latest topology

pub mod controller;

pub use controller::Syncer;

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::dataplane::DataplaneError;
use crate::state::GlobalState;

/// Why a pass was abandoned.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Synthesis task failed: {0}")]
    Synthesis(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Apply(#[from] DataplaneError),
}

/// Summary of recent sync activity, exposed by the admin API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Passes committed since startup.
    pub commits: u64,
    /// Unix time of the last commit.
    pub last_commit_unix: Option<u64>,
    /// Transaction of the last commit that wrote anything.
    pub last_transaction_id: Option<String>,
    /// Upstreams whose synthesis failed in the last committed pass.
    pub failed_upstreams: Vec<String>,
    /// Error of the last abandoned pass, cleared by the next commit.
    pub last_error: Option<String>,
}

/// Shared view of the committed snapshot and the sync report.
#[derive(Clone)]
pub struct SyncHandle {
    committed: Arc<ArcSwap<GlobalState>>,
    report: Arc<ArcSwap<SyncReport>>,
}

impl SyncHandle {
    pub fn new(initial: GlobalState) -> Self {
        Self {
            committed: Arc::new(ArcSwap::from_pointee(initial)),
            report: Arc::new(ArcSwap::from_pointee(SyncReport::default())),
        }
    }

    /// Last committed snapshot.
    pub fn committed(&self) -> Arc<GlobalState> {
        self.committed.load_full()
    }

    pub fn report(&self) -> Arc<SyncReport> {
        self.report.load_full()
    }

    pub(crate) fn publish(&self, state: GlobalState, failed_upstreams: Vec<String>, transaction_id: Option<String>) {
        self.committed.store(Arc::new(state));

        let previous = self.report.load();
        self.report.store(Arc::new(SyncReport {
            commits: previous.commits + 1,
            last_commit_unix: Some(unix_now()),
            last_transaction_id: transaction_id.or_else(|| previous.last_transaction_id.clone()),
            failed_upstreams,
            last_error: None,
        }));
    }

    pub(crate) fn record_error(&self, error: String) {
        let mut report = SyncReport::clone(&self.report.load());
        report.last_error = Some(error);
        self.report.store(Arc::new(report));
    }
}

impl Default for SyncHandle {
    fn default() -> Self {
        Self::new(GlobalState::default())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
