//! Log output for the daemon: transitions, host order, summary table.

use std::fmt::Write;

use tracing::{info, warn};

use tcpwatch_core::{HostSpec, SortMode};
use tcpwatch_monitor::{HostEvent, HostRegistry, HostState, HostStatus};
use tcpwatch_probe::Prober;

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub target: String,
    pub status: &'static str,
    pub latency: String,
    pub p95: String,
    /// Share of successful probes in the sample window.
    pub success: String,
    pub failures: u32,
}

impl SummaryRow {
    fn new(spec: &HostSpec, state: Option<&HostState>) -> Self {
        let target = spec.key().to_string();
        match state {
            Some(state) => Self {
                target,
                status: state.status().label(),
                latency: format_ms(state.last_latency_ms()),
                p95: format_ms(state.p95_latency_ms()),
                success: format_ratio(state.samples().success_ratio()),
                failures: state.consecutive_failures(),
            },
            None => Self {
                target,
                status: "STOPPED",
                latency: "-".to_string(),
                p95: "-".to_string(),
                success: "-".to_string(),
                failures: 0,
            },
        }
    }
}

fn format_ms(ms: f64) -> String {
    if ms.is_finite() {
        format!("{ms:.1} ms")
    } else {
        "-".to_string()
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |r| format!("{:.0}%", r * 100.0))
}

pub fn log_event(event: &HostEvent) {
    match event.change.to {
        HostStatus::Online => info!(
            host = %event.key,
            from = event.change.from.label(),
            latency_ms = event.latency_ms.unwrap_or_default(),
            notify = event.notify_on_change,
            "host online"
        ),
        HostStatus::Offline => warn!(
            host = %event.key,
            from = event.change.from.label(),
            error = event.message.as_deref().unwrap_or(""),
            notify = event.notify_on_change,
            "host offline"
        ),
        HostStatus::Unknown => {}
    }
}

pub fn log_order<P: Prober>(registry: &HostRegistry<P>, mode: SortMode) {
    let order: Vec<String> = registry
        .ordered(mode)
        .into_iter()
        .map(|spec| spec.key().to_string())
        .collect();
    info!(mode = mode.as_str(), order = %order.join(", "), "host order");
}

pub fn summary_rows<P: Prober>(registry: &HostRegistry<P>, mode: SortMode) -> Vec<SummaryRow> {
    registry
        .ordered(mode)
        .into_iter()
        .map(|spec| SummaryRow::new(spec, registry.state(spec.key())))
        .collect()
}

/// Fixed-width text table, header first.
pub fn render_table(rows: &[SummaryRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.target.len())
        .max()
        .unwrap_or(0)
        .max("HOST".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:<8}  {:>10}  {:>10}  {:>5}  {:>5}",
        "HOST", "STATUS", "LATENCY", "P95", "UP", "FAILS"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:<8}  {:>10}  {:>10}  {:>5}  {:>5}",
            row.target, row.status, row.latency, row.p95, row.success, row.failures
        );
    }
    out
}

pub fn log_summary<P: Prober>(registry: &HostRegistry<P>, mode: SortMode) {
    let rows = summary_rows(registry, mode);
    let online = rows.iter().filter(|r| r.status == "ONLINE").count();
    info!(
        hosts = rows.len(),
        online,
        running = registry.running_count(),
        "summary\n{}",
        render_table(&rows)
    );
}
