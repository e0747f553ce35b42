//! Read-only view of throttler state for diagnostics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::telemetry::ThrottleTotals;

/// Live counts for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainSnapshot {
    /// Requests currently in flight for this domain.
    pub active: usize,

    /// Requests for this domain waiting in the queue.
    pub queued: usize,
}

/// Point-in-time state of a throttler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThrottleSnapshot {
    /// Requests currently in flight across all domains.
    pub active: usize,

    /// Requests waiting in the queue.
    pub queued: usize,

    /// Per-domain breakdown, for every domain seen so far.
    pub domains: BTreeMap<String, DomainSnapshot>,

    /// Cumulative counters since the throttler was created.
    pub totals: ThrottleTotals,
}

impl ThrottleSnapshot {
    /// Check if nothing is active or queued.
    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.queued == 0
    }

    /// Live counts for a domain (zero if never seen).
    pub fn domain(&self, domain: &str) -> DomainSnapshot {
        self.domains.get(domain).copied().unwrap_or_default()
    }
}
