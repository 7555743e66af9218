//! Probe worker: one background task per monitored host.
//!
//! The task probes, emits the result, and then waits for the backoff
//! period. A stop signal ends the wait immediately, but a probe that is
//! already in flight always runs to completion and its result is still
//! emitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use tcpwatch_core::{HostKey, HostSpec, ProbeOutcome, ProbeResult, ProbeSettings};

use crate::backoff::BackoffTracker;
use crate::prober::Prober;

/// Lifecycle of a worker as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Spawned, first probe not started yet.
    Idle,
    /// A connect attempt is in flight.
    Probing,
    /// Sleeping until the next cycle.
    Waiting { wait: Duration },
    /// Terminal. Reached after a stop observed while waiting, after the
    /// probe that was in flight when the stop arrived, or straight from
    /// `Idle` when the stop lands before the first cycle.
    Stopped,
}

/// Ownership token for one running worker and its result channel.
///
/// Dropping the handle signals the worker to stop but does not wait for
/// it; use [`WorkerHandle::stop`] to stop and join.
pub struct WorkerHandle {
    key: HostKey,
    settings_tx: watch::Sender<ProbeSettings>,
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<WorkerState>,
    results: mpsc::UnboundedReceiver<ProbeResult>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn a worker for `spec` on the current tokio runtime.
    pub fn spawn<P: Prober>(spec: &HostSpec, prober: Arc<P>) -> Self {
        let key = spec.key().clone();
        let (settings_tx, settings_rx) = watch::channel(spec.settings());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WorkerState::Idle);
        let (results_tx, results) = mpsc::unbounded_channel();

        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            run_probe_loop(
                task_key,
                prober,
                settings_rx,
                shutdown_rx,
                state_tx,
                results_tx,
            )
            .await;
        });

        info!(host = %key, "probe worker started");

        Self {
            key,
            settings_tx,
            shutdown_tx,
            state_rx,
            results,
            handle: Some(handle),
        }
    }

    pub fn key(&self) -> &HostKey {
        &self.key
    }

    /// Current worker state.
    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }

    pub fn settings(&self) -> ProbeSettings {
        *self.settings_tx.borrow()
    }

    /// Replace interval and timeout. Picked up at the start of the next
    /// cycle; the cycle in flight keeps the old values.
    pub fn update_settings(&self, settings: ProbeSettings) {
        self.settings_tx.send_replace(settings);
    }

    /// Ask the worker to stop. Idempotent and non-blocking.
    pub fn signal_stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// True once the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Take every result currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<ProbeResult> {
        let mut out = Vec::new();
        while let Ok(result) = self.results.try_recv() {
            out.push(result);
        }
        out
    }

    /// Wait for the next result. Returns `None` once the worker has stopped
    /// and the channel is empty.
    pub async fn next_result(&mut self) -> Option<ProbeResult> {
        self.results.recv().await
    }

    /// Wait until the worker reports [`WorkerState::Stopped`].
    pub async fn wait_stopped(&self) {
        let mut state = self.state_rx.clone();
        // The sender only goes away after publishing Stopped.
        let _ = state.wait_for(|s| *s == WorkerState::Stopped).await;
    }

    /// Signal stop, join the task, and hand back results that were emitted
    /// but not yet drained.
    pub async fn stop(mut self) -> Vec<ProbeResult> {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(host = %self.key, error = %e, "probe worker panicked");
            }
        }
        info!(host = %self.key, "probe worker stopped");
        self.drain()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// The probe loop for a single host.
async fn run_probe_loop<P: Prober>(
    key: HostKey,
    prober: Arc<P>,
    mut settings: watch::Receiver<ProbeSettings>,
    mut shutdown: watch::Receiver<bool>,
    state: watch::Sender<WorkerState>,
    results: mpsc::UnboundedSender<ProbeResult>,
) {
    let mut tracker = BackoffTracker::new();

    debug!(host = %key, "probe loop starting");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let ProbeSettings { interval, timeout } = *settings.borrow_and_update();

        state.send_replace(WorkerState::Probing);
        let started = Instant::now();
        let outcome = prober.probe(&key.host, key.port, timeout).await;
        let streak = tracker.record(outcome.is_ok());

        match &outcome {
            ProbeOutcome::Success { latency_ms } => {
                debug!(host = %key, latency_ms = *latency_ms, "probe ok");
            }
            ProbeOutcome::Failure { message } => {
                debug!(host = %key, streak, error = %message, "probe failed");
            }
        }

        if results.send(ProbeResult::new(key.clone(), outcome)).is_err() {
            debug!(host = %key, "result receiver gone");
            break;
        }

        let wait = tracker.next_wait(interval, started.elapsed());
        state.send_replace(WorkerState::Waiting { wait });

        // A stop raised while probing is already marked changed, so this
        // returns at once; the flag itself is checked at the top of the loop.
        let handle_dropped = tokio::select! {
            _ = tokio::time::sleep(wait) => false,
            changed = shutdown.changed() => changed.is_err(),
        };
        if handle_dropped {
            break;
        }
    }

    state.send_replace(WorkerState::Stopped);
    debug!(host = %key, "probe loop finished");
}
