//! tcpwatch-probe: per-host probe workers.
//!
//! Each monitored host gets one background task that connects, reports,
//! and sleeps. Failures stretch the sleep exponentially; a success snaps it
//! back to the base interval.
//!
//! # Architecture
//!
//! ```text
//! WorkerHandle (held by the consumer)
//!   ├── settings  (watch)  → interval / timeout, read fresh each cycle
//!   ├── shutdown  (watch)  → observed only while Waiting
//!   ├── state     (watch)  ← Idle / Probing / Waiting / Stopped
//!   └── results   (mpsc, unbounded) ← one ProbeResult per cycle
//!
//! worker task
//!   ├── Prober::probe() → ProbeOutcome
//!   └── BackoffTracker (failure streak, next wait)
//! ```
//!
//! Workers never touch aggregated state. The only data they share with the
//! rest of the system is the stop flag and the settings value.

pub mod backoff;
pub mod prober;
pub mod worker;

pub use backoff::{BackoffTracker, MAX_BACKOFF, STREAK_CAP, backoff};
pub use prober::{Prober, TcpProber, tcp_probe};
pub use worker::{WorkerHandle, WorkerState};
