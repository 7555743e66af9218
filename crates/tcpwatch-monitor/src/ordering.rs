//! Presentation ordering.
//!
//! `sort_key` is pure: it reads nothing but its arguments, so sorting an
//! unchanged list twice gives the same order. When to sort is the caller's
//! decision.

use std::cmp::Ordering;

use tcpwatch_core::{HostSpec, SortMode};

use crate::state::HostState;

/// Latency wrapper with a total order (`+inf` last).
#[derive(Debug, Clone, Copy)]
pub struct Latency(pub f64);

impl PartialEq for Latency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Latency {}

impl PartialOrd for Latency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Latency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Comparable key, fields compared in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub offline: bool,
    pub latency: Latency,
    pub host: String,
    /// Final tiebreak so two ports on one host still order totally.
    pub port: u16,
}

pub fn sort_key(mode: SortMode, state: &HostState, spec: &HostSpec) -> SortKey {
    let host = spec.host().to_lowercase();
    let port = spec.port();
    match mode {
        SortMode::Status => SortKey {
            offline: !state.last_ok(),
            latency: Latency(state.last_latency_ms()),
            host,
            port,
        },
        SortMode::Latency => SortKey {
            offline: false,
            latency: Latency(state.last_latency_ms()),
            host,
            port,
        },
        SortMode::Host => SortKey {
            offline: false,
            latency: Latency(0.0),
            host,
            port,
        },
    }
}

/// Sort `(spec, state)` pairs in place by `mode`.
pub fn sort_entries(mode: SortMode, entries: &mut [(&HostSpec, &HostState)]) {
    entries.sort_by_cached_key(|(spec, state)| sort_key(mode, state, spec));
}
