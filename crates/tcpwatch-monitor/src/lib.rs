//! tcpwatch-monitor: the consumer side of the probing engine.
//!
//! Owns everything derived from probe results. A single context (the
//! caller's controller loop) drains every worker's channel and applies the
//! results; workers never see this state, so nothing here is locked.
//!
//! # Architecture
//!
//! ```text
//! HostRegistry
//!   ├── specs: ordered HostSpec list (persisted shape)
//!   └── per live host
//!       ├── WorkerHandle (tcpwatch-probe)
//!       └── HostState
//!           ├── last result, failure streak
//!           └── SampleWindow → p95 latency
//!
//! ordering::sort_key(mode, state, spec) → SortKey
//! ```

pub mod error;
pub mod ordering;
pub mod registry;
pub mod state;
pub mod window;

pub use error::{RegistryError, RegistryResult};
pub use ordering::{Latency, SortKey, sort_entries, sort_key};
pub use registry::{HostEvent, HostRegistry};
pub use state::{FAILURE_CAP, HostState, HostStatus, StatusChange};
pub use window::{DEFAULT_P95_MS, SAMPLE_CAPACITY, Sample, SampleWindow};
