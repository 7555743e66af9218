//! tcpwatchd: headless TCP reachability monitor.
//!
//! Loads the host list from a JSON config (or seeds one host from the
//! command line), probes every host on its own cadence, and logs status
//! transitions plus a periodic summary. Ctrl-C stops all workers and
//! writes the config back.
//!
//! # Usage
//!
//! ```text
//! tcpwatchd --host 10.0.0.1 --port 22 --interval 2 --timeout 2 --config config.json
//! ```

mod config_store;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tcpwatch_core::{BootstrapParams, SortMode, period_from_secs};
use tcpwatch_monitor::HostRegistry;
use tcpwatch_probe::TcpProber;

const DEFAULT_FILTER: &str = "info,tcpwatch=debug";

#[derive(Debug, Parser)]
#[command(name = "tcpwatchd", about = "TCP reachability and latency monitor")]
struct Cli {
    /// Host to monitor when the config lists none.
    #[arg(long, default_value = "example.com")]
    host: String,

    /// Port for the bootstrap host.
    #[arg(long, default_value_t = 22)]
    port: u16,

    /// Default probe interval in seconds (minimum 0.5).
    #[arg(long, default_value_t = 2.0)]
    interval: f64,

    /// Default connect timeout in seconds (minimum 0.5).
    #[arg(long, default_value_t = 2.0)]
    timeout: f64,

    /// Config file, read at startup and written on exit.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// How often results are drained, in milliseconds.
    #[arg(long, default_value_t = 120)]
    poll_ms: u64,

    /// Summary table period in seconds.
    #[arg(long, default_value_t = 10)]
    report_secs: u64,

    /// Override the saved sort mode (status, latency, host).
    #[arg(long)]
    sort_by: Option<SortMode>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn bootstrap(&self) -> BootstrapParams {
        BootstrapParams {
            host: self.host.clone(),
            port: self.port,
            interval: period_from_secs(self.interval),
            timeout: period_from_secs(self.timeout),
        }
    }

    fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(10))
    }

    fn report_period(&self) -> Duration {
        Duration::from_secs(self.report_secs.max(1))
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(config = %cli.config.display(), "tcpwatchd starting");

    let config = config_store::load_or_none(&cli.config);
    let mut view = config.as_ref().map(|c| c.view.clone()).unwrap_or_default();
    if let Some(mode) = cli.sort_by {
        view.sort_by = mode;
    }

    let mut registry =
        HostRegistry::from_config(Arc::new(TcpProber), config.as_ref(), &cli.bootstrap())
            .context("no usable host to monitor")?;
    registry.start_all();
    report::log_order(&registry, view.sort_by);

    // ── Main loop ──────────────────────────────────────────────

    let mut poll = tokio::time::interval(cli.poll_period());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = tokio::time::interval(cli.report_period());
    summary.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires at once; skip it so the first table has data.
    summary.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let events = registry.poll();
                for event in &events {
                    report::log_event(event);
                }
                if view.auto_sort && !events.is_empty() {
                    report::log_order(&registry, view.sort_by);
                }
            }
            _ = summary.tick() => {
                report::log_summary(&registry, view.sort_by);
            }
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    error!(error = %e, "failed to listen for ctrl-c");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    // ── Shutdown ───────────────────────────────────────────────

    registry.shutdown().await;
    let config = registry.to_config(&view);
    if let Err(e) = config_store::save(&cli.config, &config) {
        error!(error = %format!("{e:#}"), "failed to save config");
    }

    info!("tcpwatchd stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcpwatch_core::MAX_PERIOD;

    #[test]
    fn defaults_match_bootstrap_defaults() {
        let cli = Cli::try_parse_from(["tcpwatchd"]).unwrap();
        assert_eq!(cli.bootstrap(), BootstrapParams::default());
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.poll_period(), Duration::from_millis(120));
        assert!(!cli.log_json);
    }

    #[test]
    fn periods_are_clamped() {
        let cli = Cli::try_parse_from([
            "tcpwatchd",
            "--interval",
            "0.1",
            "--timeout",
            "0",
            "--poll-ms",
            "0",
            "--report-secs",
            "0",
        ])
        .unwrap();
        let bootstrap = cli.bootstrap();
        assert_eq!(bootstrap.interval, Duration::from_millis(500));
        assert_eq!(bootstrap.timeout, Duration::from_millis(500));
        assert_eq!(cli.poll_period(), Duration::from_millis(10));
        assert_eq!(cli.report_period(), Duration::from_secs(1));
    }

    #[test]
    fn huge_interval_saturates() {
        let cli = Cli::try_parse_from(["tcpwatchd", "--interval", "1e20", "--timeout", "inf"]).unwrap();
        let bootstrap = cli.bootstrap();
        assert_eq!(bootstrap.interval, MAX_PERIOD);
        assert_eq!(bootstrap.timeout, MAX_PERIOD);
    }

    #[test]
    fn explicit_host_and_port() {
        let cli = Cli::try_parse_from([
            "tcpwatchd",
            "--host",
            "10.0.0.1",
            "--port",
            "2222",
            "--log-json",
        ])
        .unwrap();
        let bootstrap = cli.bootstrap();
        assert_eq!(bootstrap.host, "10.0.0.1");
        assert_eq!(bootstrap.port, 2222);
        assert!(cli.log_json);
    }

    #[test]
    fn sort_mode_parses_case_insensitively() {
        let cli = Cli::try_parse_from(["tcpwatchd", "--sort-by", "Latency"]).unwrap();
        assert_eq!(cli.sort_by, Some(SortMode::Latency));
        assert!(Cli::try_parse_from(["tcpwatchd", "--sort-by", "random"]).is_err());
    }

    #[test]
    fn port_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["tcpwatchd", "--port", "70000"]).is_err());
    }
}
