//! Host registry: the consumer context of the engine.
//!
//! Holds the configured host list, one `WorkerHandle` per running host and
//! the `HostState` fed by that worker. State lives exactly as long as its
//! handle: removing or stopping a host joins the worker first, then drops
//! the state, so no result can land on discarded state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tcpwatch_core::{
    BootstrapParams, HostConfig, HostKey, HostSpec, MonitorConfig, SortMode, ViewPrefs,
    clamp_period,
};
use tcpwatch_probe::{Prober, TcpProber, WorkerHandle, WorkerState};

use crate::error::{RegistryError, RegistryResult};
use crate::ordering::sort_entries;
use crate::state::{HostState, StatusChange};

/// A status transition observed while polling.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub key: HostKey,
    pub change: StatusChange,
    /// Copied from the host's spec; the registry never acts on it.
    pub notify_on_change: bool,
    pub latency_ms: Option<f64>,
    pub message: Option<String>,
}

struct LiveHost {
    worker: WorkerHandle,
    state: HostState,
}

/// Owns every monitored host and its worker.
///
/// Methods that start workers must run inside a tokio runtime.
pub struct HostRegistry<P: Prober = TcpProber> {
    prober: Arc<P>,
    /// Configured hosts in insertion order.
    specs: Vec<HostSpec>,
    live: HashMap<HostKey, LiveHost>,
    default_interval: Duration,
    default_timeout: Duration,
}

impl<P: Prober> HostRegistry<P> {
    /// Empty registry. Nothing is started.
    pub fn new(prober: Arc<P>, default_interval: Duration, default_timeout: Duration) -> Self {
        Self {
            prober,
            specs: Vec::new(),
            live: HashMap::new(),
            default_interval: clamp_period(default_interval),
            default_timeout: clamp_period(default_timeout),
        }
    }

    /// Seed from a persisted config, or from `bootstrap` when there is no
    /// config or it lists no usable host.
    ///
    /// Invalid and duplicate entries are logged and skipped. Nothing is
    /// started; call [`HostRegistry::start_all`].
    pub fn from_config(
        prober: Arc<P>,
        config: Option<&MonitorConfig>,
        bootstrap: &BootstrapParams,
    ) -> RegistryResult<Self> {
        if let Some(config) = config {
            let mut registry =
                Self::new(prober.clone(), config.default_interval(), config.default_timeout());
            for (index, spec) in config.host_specs().into_iter().enumerate() {
                match spec {
                    Ok(spec) => {
                        if let Err(e) = registry.insert_spec(spec) {
                            warn!(index, error = %e, "skipping host entry");
                        }
                    }
                    Err(e) => warn!(index, error = %e, "skipping invalid host entry"),
                }
            }
            if !registry.specs.is_empty() {
                info!(hosts = registry.specs.len(), "registry loaded from config");
                return Ok(registry);
            }
            debug!("config lists no usable host, using bootstrap host");
        }

        let mut registry = Self::new(prober, bootstrap.interval, bootstrap.timeout);
        let spec = bootstrap.to_spec()?;
        info!(host = %spec.key(), "registry seeded from bootstrap host");
        registry.insert_spec(spec)?;
        Ok(registry)
    }

    fn insert_spec(&mut self, spec: HostSpec) -> RegistryResult<()> {
        if self.specs.iter().any(|s| s.key() == spec.key()) {
            return Err(RegistryError::DuplicateHost(spec.key().clone()));
        }
        self.specs.push(spec);
        Ok(())
    }

    fn spawn(&mut self, spec: &HostSpec) {
        let worker = WorkerHandle::spawn(spec, self.prober.clone());
        self.live.insert(
            spec.key().clone(),
            LiveHost {
                worker,
                state: HostState::new(),
            },
        );
    }

    /// Add a host and start its worker.
    pub fn add_host(&mut self, spec: HostSpec) -> RegistryResult<()> {
        self.insert_spec(spec.clone())?;
        self.spawn(&spec);
        info!(host = %spec.key(), "host added");
        Ok(())
    }

    /// Add `host:port` with the current default interval and timeout.
    pub fn add_endpoint(&mut self, host: &str, port: u16) -> RegistryResult<HostKey> {
        let spec = HostSpec::new(host, port, self.default_interval, self.default_timeout, true)?;
        let key = spec.key().clone();
        self.add_host(spec)?;
        Ok(key)
    }

    /// Stop the host's worker, wait for it to finish, then forget the host.
    pub async fn remove_host(&mut self, key: &HostKey) -> RegistryResult<HostSpec> {
        let index = self
            .specs
            .iter()
            .position(|s| s.key() == key)
            .ok_or_else(|| RegistryError::UnknownHost(key.clone()))?;

        if let Some(live) = self.live.remove(key) {
            let discarded = live.worker.stop().await;
            debug!(host = %key, discarded = discarded.len(), "dropping host state");
        }
        let spec = self.specs.remove(index);
        info!(host = %key, "host removed");
        Ok(spec)
    }

    /// Start a worker for every configured host that has none. Returns how
    /// many were started.
    pub fn start_all(&mut self) -> usize {
        let idle: Vec<HostSpec> = self
            .specs
            .iter()
            .filter(|s| !self.live.contains_key(s.key()))
            .cloned()
            .collect();
        for spec in &idle {
            self.spawn(spec);
        }
        if !idle.is_empty() {
            info!(started = idle.len(), "workers started");
        }
        idle.len()
    }

    /// Stop every worker and discard its state. All workers are signalled
    /// before the first join.
    pub async fn stop_all(&mut self) -> usize {
        for live in self.live.values() {
            live.worker.signal_stop();
        }
        let hosts: Vec<(HostKey, LiveHost)> = self.live.drain().collect();
        let stopped = hosts.len();
        for (key, live) in hosts {
            let discarded = live.worker.stop().await;
            debug!(host = %key, discarded = discarded.len(), "worker joined");
        }
        if stopped > 0 {
            info!(stopped, "workers stopped");
        }
        stopped
    }

    /// Stop everything if any worker is running, otherwise start everything.
    /// Returns whether workers are running afterwards.
    pub async fn toggle_all(&mut self) -> bool {
        if self.live.is_empty() {
            self.start_all() > 0
        } else {
            self.stop_all().await;
            false
        }
    }

    pub fn is_running(&self, key: &HostKey) -> bool {
        self.live
            .get(key)
            .is_some_and(|live| !live.worker.is_finished())
    }

    pub fn running_count(&self) -> usize {
        self.live.len()
    }

    pub fn worker_state(&self, key: &HostKey) -> Option<WorkerState> {
        self.live.get(key).map(|live| live.worker.state())
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Set the default interval and apply it to every host, running or not.
    pub fn set_default_interval(&mut self, interval: Duration) {
        let interval = clamp_period(interval);
        self.default_interval = interval;
        for spec in &mut self.specs {
            spec.interval = interval;
        }
        self.push_settings();
        info!(interval_ms = interval.as_millis() as u64, "default interval updated");
    }

    /// Set the default timeout and apply it to every host, running or not.
    pub fn set_default_timeout(&mut self, timeout: Duration) {
        let timeout = clamp_period(timeout);
        self.default_timeout = timeout;
        for spec in &mut self.specs {
            spec.timeout = timeout;
        }
        self.push_settings();
        info!(timeout_ms = timeout.as_millis() as u64, "default timeout updated");
    }

    fn push_settings(&self) {
        for spec in &self.specs {
            if let Some(live) = self.live.get(spec.key()) {
                live.worker.update_settings(spec.settings());
            }
        }
    }

    /// Edit one host's policy. A running worker picks it up next cycle.
    pub fn update_host(
        &mut self,
        key: &HostKey,
        interval: Duration,
        timeout: Duration,
        notify_on_change: bool,
    ) -> RegistryResult<()> {
        let spec = self
            .specs
            .iter_mut()
            .find(|s| s.key() == key)
            .ok_or_else(|| RegistryError::UnknownHost(key.clone()))?;
        spec.interval = clamp_period(interval);
        spec.timeout = clamp_period(timeout);
        spec.notify_on_change = notify_on_change;

        if let Some(live) = self.live.get(key) {
            live.worker.update_settings(spec.settings());
        }
        debug!(host = %key, "host settings updated");
        Ok(())
    }

    /// Drain every worker's channel and apply the results in order.
    /// Returns the status transitions seen, grouped by host in list order.
    pub fn poll(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        for spec in &self.specs {
            let Some(live) = self.live.get_mut(spec.key()) else {
                continue;
            };
            for result in live.worker.drain() {
                if let Some(change) = live.state.apply(&result) {
                    events.push(HostEvent {
                        key: result.key.clone(),
                        change,
                        notify_on_change: spec.notify_on_change,
                        latency_ms: result.latency_ms(),
                        message: result.error_message().map(str::to_string),
                    });
                }
            }
        }
        events
    }

    /// State of a running host.
    pub fn state(&self, key: &HostKey) -> Option<&HostState> {
        self.live.get(key).map(|live| &live.state)
    }

    pub fn spec(&self, key: &HostKey) -> Option<&HostSpec> {
        self.specs.iter().find(|s| s.key() == key)
    }

    pub fn specs(&self) -> &[HostSpec] {
        &self.specs
    }

    /// Hosts in display order. Stopped hosts sort as never probed.
    pub fn ordered(&self, mode: SortMode) -> Vec<&HostSpec> {
        let unknown = HostState::new();
        let mut entries: Vec<(&HostSpec, &HostState)> = self
            .specs
            .iter()
            .map(|spec| {
                let state = self
                    .live
                    .get(spec.key())
                    .map_or(&unknown, |live| &live.state);
                (spec, state)
            })
            .collect();
        sort_entries(mode, &mut entries);
        entries.into_iter().map(|(spec, _)| spec).collect()
    }

    /// Persisted shape of the registry plus the caller's view preferences.
    pub fn to_config(&self, view: &ViewPrefs) -> MonitorConfig {
        MonitorConfig {
            hosts: self.specs.iter().map(HostConfig::from).collect(),
            default_interval: self.default_interval.as_secs_f64(),
            default_timeout: self.default_timeout.as_secs_f64(),
            view: view.clone(),
        }
    }

    /// Stop and join every worker.
    pub async fn shutdown(&mut self) {
        let stopped = self.stop_all().await;
        info!(stopped, "registry shut down");
    }
}
