//! Bounded FIFO of recent probe samples.

use std::collections::VecDeque;

/// Number of samples kept per host.
pub const SAMPLE_CAPACITY: usize = 100;

/// Reported p95 when no successful sample is in the window.
pub const DEFAULT_P95_MS: f64 = 20.0;

/// One entry of the rolling window. Failed probes are stored with a
/// latency of 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub latency_ms: f64,
    pub ok: bool,
}

#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::with_capacity(SAMPLE_CAPACITY)
    }
}

impl SampleWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// 95th percentile of the successful latencies in the window.
    ///
    /// Nearest-rank on the ascending sort: index `ceil(0.95 * n) - 1`.
    /// Returns [`DEFAULT_P95_MS`] when nothing in the window succeeded.
    pub fn p95_latency_ms(&self) -> f64 {
        let mut latencies: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.ok)
            .map(|s| s.latency_ms)
            .collect();
        if latencies.is_empty() {
            return DEFAULT_P95_MS;
        }
        latencies.sort_unstable_by(f64::total_cmp);

        let rank = (latencies.len() as f64 * 0.95).ceil() as usize;
        latencies[rank.saturating_sub(1)]
    }

    /// Share of successful samples, `None` when empty.
    pub fn success_ratio(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let ok = self.samples.iter().filter(|s| s.ok).count();
        Some(ok as f64 / self.samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(latency_ms: f64) -> Sample {
        Sample {
            latency_ms,
            ok: true,
        }
    }

    fn failed() -> Sample {
        Sample {
            latency_ms: 0.0,
            ok: false,
        }
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut window = SampleWindow::with_capacity(80);
        for i in 0..500 {
            window.push(ok(i as f64));
            assert!(window.len() <= 80);
        }
        assert_eq!(window.len(), 80);
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut window = SampleWindow::with_capacity(3);
        for i in 1..=5 {
            window.push(ok(i as f64));
        }
        let kept: Vec<f64> = window.iter().map(|s| s.latency_ms).collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn p95_defaults_without_successes() {
        let mut window = SampleWindow::default();
        assert_eq!(window.p95_latency_ms(), DEFAULT_P95_MS);
        window.push(failed());
        window.push(failed());
        assert_eq!(window.p95_latency_ms(), DEFAULT_P95_MS);
    }

    #[test]
    fn p95_single_value() {
        let mut window = SampleWindow::default();
        window.push(ok(42.0));
        assert_eq!(window.p95_latency_ms(), 42.0);
    }

    #[test]
    fn p95_of_one_to_hundred() {
        let mut window = SampleWindow::default();
        // Push in reverse so the sort matters.
        for i in (1..=100).rev() {
            window.push(ok(i as f64));
        }
        // ceil(95.0) - 1 = index 94 → 95.
        assert_eq!(window.p95_latency_ms(), 95.0);
    }

    #[test]
    fn p95_small_counts_use_nearest_rank() {
        let mut window = SampleWindow::default();
        for v in [10.0, 30.0, 20.0] {
            window.push(ok(v));
        }
        // ceil(2.85) - 1 = 2 → largest.
        assert_eq!(window.p95_latency_ms(), 30.0);
    }

    #[test]
    fn p95_ignores_failed_samples() {
        let mut window = SampleWindow::default();
        window.push(ok(5.0));
        for _ in 0..50 {
            window.push(failed());
        }
        assert_eq!(window.p95_latency_ms(), 5.0);
    }

    #[test]
    fn success_ratio_counts_oks() {
        let mut window = SampleWindow::default();
        assert_eq!(window.success_ratio(), None);
        window.push(ok(1.0));
        window.push(failed());
        window.push(ok(2.0));
        window.push(failed());
        assert_eq!(window.success_ratio(), Some(0.5));
    }
}
