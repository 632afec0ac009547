//! Staleness-based liveness judgment
//!
//! A server counts as alive while its heartbeat is younger than the fleet-wide
//! staleness threshold. The threshold is deliberately a constant, not per-server
//! configuration: every fleet member is judged by the same clock.

use chrono::{DateTime, Utc};

use crate::ServerRecord;

/// Heartbeats older than this no longer count as alive.
///
/// The poll interval must stay strictly below this value or liveness will
/// visibly flap between refreshes.
pub const STALE_THRESHOLD_MS: i64 = 10_000;

/// A server's record with its liveness judged at `now`.
///
/// Computed, never stored: rebuilt from the latest poll on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedServerView {
    pub server_id: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub ip_address: String,
    pub alive: bool,
}

/// Whether a heartbeat at `last_seen` still counts as alive at `now`.
///
/// A missing heartbeat is dead, never an error: liveness is a display
/// predicate, not a validity check. The boundary is exclusive, so a heartbeat
/// aged exactly at the threshold is already dead.
pub fn is_alive(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_seen {
        Some(last) => (now - last).num_milliseconds() < STALE_THRESHOLD_MS,
        None => false,
    }
}

/// Judge a polled record against the wall clock.
pub fn derive_view(record: ServerRecord, now: DateTime<Utc>) -> DerivedServerView {
    let alive = is_alive(record.last_seen, now);

    DerivedServerView {
        server_id: record.server_id,
        last_seen: record.last_seen,
        ip_address: record.ip_address,
        alive,
    }
}
