//! Persisted configuration shape.
//!
//! The JSON layout is owned by whoever persists it; this module only maps
//! it to and from domain types. Missing fields take the defaults the
//! monitor has always used, and unknown `theme` / `sort_by` strings fall
//! back to the defaults instead of rejecting the whole file. Host entries
//! are read field by field: a mistyped or out-of-range value only
//! invalidates its own entry, which `host_specs` reports in place.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{HostSpec, SortMode, Theme, period_from_secs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default = "default_period_secs")]
    pub default_interval: f64,
    #[serde(default = "default_period_secs")]
    pub default_timeout: f64,
    #[serde(flatten)]
    pub view: ViewPrefs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host", deserialize_with = "lenient_host")]
    pub host: String,
    /// Kept wide so an out-of-range port survives parsing and is rejected
    /// by [`HostConfig::to_spec`] for this entry alone.
    #[serde(default = "default_port", deserialize_with = "lenient_port")]
    pub port: i64,
    #[serde(default = "default_period_secs", deserialize_with = "lenient_period")]
    pub interval: f64,
    #[serde(default = "default_period_secs", deserialize_with = "lenient_period")]
    pub timeout: f64,
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub sound_on_change: bool,
}

/// Presentation preferences. The engine stores them but never reads them;
/// callers pass the relevant ones (sort mode, auto-sort) explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPrefs {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub theme: Theme,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_by: SortMode,
    #[serde(default = "default_true")]
    pub auto_sort: bool,
    #[serde(default)]
    pub ultra: bool,
}

/// Parameters used to seed the first host when nothing is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapParams {
    pub host: String,
    pub port: u16,
    pub interval: Duration,
    pub timeout: Duration,
}

fn default_host() -> String {
    "example.com".to_string()
}
fn default_port() -> i64 {
    22
}
fn default_period_secs() -> f64 {
    2.0
}
fn default_alpha() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

/// Deserialize a value, falling back to its default on any mismatch.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Non-string hosts become empty and fail validation as `EmptyHost`.
fn lenient_host<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_default())
}

/// Integers, floats (truncated) and numeric strings. Anything else maps to
/// 0, which validation rejects.
fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let port = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(port.unwrap_or(0))
}

fn lenient_period<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let secs = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(secs.unwrap_or_else(default_period_secs))
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or_else(default_true))
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            theme: Theme::default(),
            sort_by: SortMode::default(),
            auto_sort: true,
            ultra: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            default_interval: default_period_secs(),
            default_timeout: default_period_secs(),
            view: ViewPrefs::default(),
        }
    }
}

impl Default for BootstrapParams {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port() as u16,
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(2),
        }
    }
}

impl BootstrapParams {
    pub fn to_spec(&self) -> ConfigResult<HostSpec> {
        HostSpec::new(&self.host, self.port, self.interval, self.timeout, true)
    }
}

impl HostConfig {
    pub fn to_spec(&self) -> ConfigResult<HostSpec> {
        let port = u16::try_from(self.port).map_err(|_| ConfigError::InvalidPort {
            host: self.host.trim().to_string(),
            port: self.port,
        })?;
        HostSpec::new(
            &self.host,
            port,
            period_from_secs(self.interval),
            period_from_secs(self.timeout),
            self.sound_on_change,
        )
    }
}

impl From<&HostSpec> for HostConfig {
    fn from(spec: &HostSpec) -> Self {
        Self {
            host: spec.host().to_string(),
            port: spec.port().into(),
            interval: spec.interval.as_secs_f64(),
            timeout: spec.timeout.as_secs_f64(),
            sound_on_change: spec.notify_on_change,
        }
    }
}

impl MonitorConfig {
    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        serde_json::from_str(s).map_err(ConfigError::Parse)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every host entry. Invalid entries come back as errors in
    /// place so the caller can report and skip them.
    pub fn host_specs(&self) -> Vec<ConfigResult<HostSpec>> {
        self.hosts.iter().map(HostConfig::to_spec).collect()
    }

    pub fn default_interval(&self) -> Duration {
        period_from_secs(self.default_interval)
    }

    pub fn default_timeout(&self) -> Duration {
        period_from_secs(self.default_timeout)
    }
}
