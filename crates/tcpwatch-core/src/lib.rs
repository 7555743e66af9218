//! tcpwatch-core: shared types for the tcpwatch probing engine.
//!
//! Everything that crosses a crate boundary lives here: host identity and
//! policy (`HostSpec`), the immutable per-probe record (`ProbeResult`), the
//! ordering modes, and the JSON shape used by whoever persists the host
//! list. This crate performs no I/O.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BootstrapParams, HostConfig, MonitorConfig, ViewPrefs};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
