//! Commands and snapshot types for the poller actors
//!
//! Snapshots are derived state: rebuilt wholesale from each poll and replaced
//! atomically, never merged into the previous generation. A failed poll
//! publishes an explicit empty snapshot with a message instead of leaving the
//! last good data on screen - staleness must never masquerade as liveness.

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::ServiceStatusRecord;
use crate::liveness::DerivedServerView;
use crate::series::PlotSeries;

/// Commands accepted by both poller actors
#[derive(Debug)]
pub enum PollerCommand {
    /// Trigger an immediate poll, bypassing the interval timer
    ///
    /// The response fires after the resulting snapshot has been published.
    PollNow {
        respond_to: oneshot::Sender<()>,
    },

    /// Stop polling
    ///
    /// A fetch already in flight is dropped without applying its result.
    Shutdown,
}

/// Fleet-level derived state: every known server with its liveness judged
/// against the wall clock at poll time.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub servers: Vec<DerivedServerView>,
    pub error: Option<String>,
    /// Monotonic per-actor counter, bumped for every published snapshot.
    pub generation: u64,
    /// `None` until the first poll completes.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Detail-level derived state for one server: plot-ready metric series plus
/// the service status list, from a single poll generation.
#[derive(Debug, Clone, Default)]
pub struct ServerSnapshot {
    pub series: PlotSeries,
    pub services: Vec<ServiceStatusRecord>,
    pub error: Option<String>,
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}
