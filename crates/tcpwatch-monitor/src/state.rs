//! Per-host derived state.
//!
//! `HostState::apply` is the only mutator. It does no I/O and cannot fail:
//! a `ProbeResult` carries a latency exactly when it succeeded, so there is
//! nothing to validate.

use tcpwatch_core::ProbeResult;

use crate::window::{Sample, SampleWindow};

/// Consecutive failures are counted up to this value, the same cap the
/// worker applies to its backoff streak.
pub const FAILURE_CAP: u32 = tcpwatch_probe::STREAK_CAP;

/// Reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// No result applied yet.
    Unknown,
    Online,
    Offline,
}

impl HostStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HostStatus::Unknown => "UNKNOWN",
            HostStatus::Online => "ONLINE",
            HostStatus::Offline => "OFFLINE",
        }
    }
}

/// Transition reported by [`HostState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: HostStatus,
    pub to: HostStatus,
}

#[derive(Debug, Clone)]
pub struct HostState {
    status: HostStatus,
    /// `f64::INFINITY` when unknown or when the last probe failed.
    last_latency_ms: f64,
    last_error: Option<String>,
    last_timestamp_ms: Option<u64>,
    consecutive_failures: u32,
    window: SampleWindow,
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}

impl HostState {
    pub fn new() -> Self {
        Self::with_window(SampleWindow::default())
    }

    pub fn with_window(window: SampleWindow) -> Self {
        Self {
            status: HostStatus::Unknown,
            last_latency_ms: f64::INFINITY,
            last_error: None,
            last_timestamp_ms: None,
            consecutive_failures: 0,
            window,
        }
    }

    /// Fold one result into the state. Returns the status transition, if
    /// the result flipped it (the first result always does).
    pub fn apply(&mut self, result: &ProbeResult) -> Option<StatusChange> {
        let previous = self.status;

        match result.latency_ms() {
            Some(latency_ms) => {
                self.status = HostStatus::Online;
                self.last_latency_ms = latency_ms;
                self.last_error = None;
                self.consecutive_failures = 0;
                self.window.push(Sample {
                    latency_ms,
                    ok: true,
                });
            }
            None => {
                self.status = HostStatus::Offline;
                self.last_latency_ms = f64::INFINITY;
                self.last_error = result.error_message().map(str::to_string);
                self.consecutive_failures = (self.consecutive_failures + 1).min(FAILURE_CAP);
                self.window.push(Sample {
                    latency_ms: 0.0,
                    ok: false,
                });
            }
        }
        self.last_timestamp_ms = Some(result.timestamp_ms);

        (previous != self.status).then_some(StatusChange {
            from: previous,
            to: self.status,
        })
    }

    /// False until a probe has succeeded, and after any failure.
    pub fn last_ok(&self) -> bool {
        self.status == HostStatus::Online
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    pub fn last_latency_ms(&self) -> f64 {
        self.last_latency_ms
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.last_timestamp_ms
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn samples(&self) -> &SampleWindow {
        &self.window
    }

    /// Display-scaling hint; not used for any control decision.
    pub fn p95_latency_ms(&self) -> f64 {
        self.window.p95_latency_ms()
    }
}
