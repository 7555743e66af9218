//! Domain types shared by the probe workers and the aggregating consumer.
//!
//! `HostSpec` is the only type that carries policy. `ProbeResult` is
//! produced once per probe cycle by a worker and never mutated after.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Lower bound for both the probe interval and the connect timeout.
pub const MIN_PERIOD: Duration = Duration::from_millis(500);

/// Upper bound for both periods. Anything longer is treated as one day.
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

// ── Host identity ─────────────────────────────────────────────────

/// Identity of a monitored endpoint. Fixed for the lifetime of a worker;
/// a rename is a remove followed by an add.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostKey {
    pub host: String,
    pub port: u16,
}

impl HostKey {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Host spec ─────────────────────────────────────────────────────

/// Identity and probing policy for one monitored endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSpec {
    key: HostKey,
    /// Base cadence between probes.
    pub interval: Duration,
    /// Per-probe connect timeout.
    pub timeout: Duration,
    /// Carried through to status-change events; the engine never acts on it.
    pub notify_on_change: bool,
}

impl HostSpec {
    /// Build a spec, trimming the host and clamping both periods into
    /// [`MIN_PERIOD`, `MAX_PERIOD`].
    pub fn new(
        host: &str,
        port: u16,
        interval: Duration,
        timeout: Duration,
        notify_on_change: bool,
    ) -> ConfigResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if port == 0 {
            return Err(ConfigError::InvalidPort {
                host: host.to_string(),
                port: port.into(),
            });
        }
        Ok(Self {
            key: HostKey::new(host, port),
            interval: clamp_period(interval),
            timeout: clamp_period(timeout),
            notify_on_change,
        })
    }

    pub fn key(&self) -> &HostKey {
        &self.key
    }

    pub fn host(&self) -> &str {
        &self.key.host
    }

    pub fn port(&self) -> u16 {
        self.key.port
    }

    /// The mutable part of the policy, as handed to a running worker.
    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            interval: self.interval,
            timeout: self.timeout,
        }
    }
}

/// Clamp a period into `[MIN_PERIOD, MAX_PERIOD]`.
pub fn clamp_period(period: Duration) -> Duration {
    period.clamp(MIN_PERIOD, MAX_PERIOD)
}

/// Convert a (possibly garbage) float seconds value into a clamped period.
///
/// NaN, zero and negative values give [`MIN_PERIOD`]; values too large for
/// a `Duration` (including `+inf`) give [`MAX_PERIOD`].
pub fn period_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return MIN_PERIOD;
    }
    Duration::try_from_secs_f64(secs).map_or(MAX_PERIOD, clamp_period)
}

/// Per-worker settings that may change between cycles without a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

// ── Probe result ──────────────────────────────────────────────────

/// Outcome of a single connect attempt. Every failure kind collapses into
/// one variant; only the message is informational.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success { latency_ms: f64 },
    Failure { message: String },
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// One probe outcome tagged with its origin and wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub key: HostKey,
    /// Unix timestamp in milliseconds when the probe finished.
    pub timestamp_ms: u64,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn new(key: HostKey, outcome: ProbeOutcome) -> Self {
        Self {
            key,
            timestamp_ms: epoch_millis(),
            outcome,
        }
    }

    pub fn ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Present iff the probe succeeded.
    pub fn latency_ms(&self) -> Option<f64> {
        match self.outcome {
            ProbeOutcome::Success { latency_ms } => Some(latency_ms),
            ProbeOutcome::Failure { .. } => None,
        }
    }

    /// Present iff the probe failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure { message } => Some(message),
        }
    }
}

// ── Presentation enums ────────────────────────────────────────────

/// How hosts are ordered for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Status,
    Latency,
    Host,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Status => "status",
            SortMode::Latency => "latency",
            SortMode::Host => "host",
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(SortMode::Status),
            "latency" => Ok(SortMode::Latency),
            "host" => Ok(SortMode::Host),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

/// Color theme preference, stored for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_trims_host_and_clamps_periods() {
        let spec = HostSpec::new(
            "  10.0.0.1 ",
            22,
            Duration::from_millis(100),
            Duration::from_secs(3),
            true,
        )
        .unwrap();
        assert_eq!(spec.host(), "10.0.0.1");
        assert_eq!(spec.interval, MIN_PERIOD);
        assert_eq!(spec.timeout, Duration::from_secs(3));
        assert_eq!(spec.key().to_string(), "10.0.0.1:22");
    }

    #[test]
    fn spec_rejects_empty_host() {
        let err = HostSpec::new("   ", 22, MIN_PERIOD, MIN_PERIOD, false).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyHost));
    }

    #[test]
    fn spec_rejects_port_zero() {
        let err = HostSpec::new("example.com", 0, MIN_PERIOD, MIN_PERIOD, false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { port: 0, .. }));
    }

    #[test]
    fn period_from_secs_handles_bad_input() {
        assert_eq!(period_from_secs(2.0), Duration::from_secs(2));
        assert_eq!(period_from_secs(0.1), MIN_PERIOD);
        assert_eq!(period_from_secs(-4.0), MIN_PERIOD);
        assert_eq!(period_from_secs(f64::NAN), MIN_PERIOD);
    }

    #[test]
    fn period_from_secs_saturates_huge_values() {
        assert_eq!(period_from_secs(1e20), MAX_PERIOD);
        assert_eq!(period_from_secs(f64::MAX), MAX_PERIOD);
        assert_eq!(period_from_secs(f64::INFINITY), MAX_PERIOD);
        assert_eq!(period_from_secs(7.0 * 86_400.0), MAX_PERIOD);
        assert_eq!(period_from_secs(3600.0), Duration::from_secs(3600));
    }

    #[test]
    fn clamp_period_bounds_both_ends() {
        assert_eq!(clamp_period(Duration::ZERO), MIN_PERIOD);
        assert_eq!(clamp_period(Duration::MAX), MAX_PERIOD);
        assert_eq!(clamp_period(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[test]
    fn result_accessors_follow_outcome() {
        let key = HostKey::new("a", 1);
        let ok = ProbeResult::new(key.clone(), ProbeOutcome::Success { latency_ms: 12.5 });
        assert!(ok.ok());
        assert_eq!(ok.latency_ms(), Some(12.5));
        assert_eq!(ok.error_message(), None);

        let bad = ProbeResult::new(
            key,
            ProbeOutcome::Failure {
                message: "connection refused".to_string(),
            },
        );
        assert!(!bad.ok());
        assert_eq!(bad.latency_ms(), None);
        assert_eq!(bad.error_message(), Some("connection refused"));
    }

    #[test]
    fn sort_mode_parses_case_insensitively() {
        assert_eq!("Latency".parse::<SortMode>(), Ok(SortMode::Latency));
        assert_eq!(SortMode::Host.as_str(), "host");
        assert!("fastest".parse::<SortMode>().is_err());
    }
}
