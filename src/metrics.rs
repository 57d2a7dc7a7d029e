use crate::controller::{Interference, RateController};
use crate::settings::DEFAULT_METRICS_INTERVAL_SECS;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsRecord {
    pub active: bool,
    pub baseline: f32,
    pub multiplier: f32,
    pub applied: f32,
    /// External changes seen since the previous record.
    pub interference: u32,
}

pub trait MetricsSink {
    fn record(&mut self, record: &MetricsRecord);

    fn interference(&mut self, _event: &Interference) {}
}

/// Emits records as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&mut self, r: &MetricsRecord) {
        info!(
            target: "rate_governor::metrics",
            active = r.active,
            baseline = r.baseline,
            multiplier = r.multiplier,
            applied = r.applied,
            interference = r.interference,
        );
    }

    fn interference(&mut self, event: &Interference) {
        warn!(
            target: "rate_governor::metrics",
            observed = event.observed,
            expected = event.expected,
            "rate changed outside the controller"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<MetricsRecord>,
    pub interferences: Vec<Interference>,
}

impl MetricsSink for MemorySink {
    fn record(&mut self, record: &MetricsRecord) {
        self.records.push(*record);
    }

    fn interference(&mut self, event: &Interference) {
        self.interferences.push(*event);
    }
}

/// Periodic snapshot emitter. Only the first interference of each window is
/// forwarded as a warning; the rest are counted into the next record.
#[derive(Debug, Clone)]
pub struct MetricsLogger {
    interval: f32,
    elapsed: f32,
    window_interference: u32,
}

impl MetricsLogger {
    pub fn new(interval_secs: f32) -> Self {
        let interval = if interval_secs.is_finite() && interval_secs > 0.0 {
            interval_secs
        } else {
            DEFAULT_METRICS_INTERVAL_SECS
        };
        Self {
            interval,
            elapsed: 0.0,
            window_interference: 0,
        }
    }

    pub fn note_interference(&mut self, event: &Interference, sink: &mut dyn MetricsSink) {
        if self.window_interference == 0 {
            sink.interference(event);
        }
        self.window_interference = self.window_interference.saturating_add(1);
    }

    /// Returns true when a record was emitted this tick.
    pub fn tick(
        &mut self,
        real_dt: f32,
        controller: &RateController,
        sink: &mut dyn MetricsSink,
    ) -> bool {
        if real_dt.is_finite() && real_dt > 0.0 {
            self.elapsed += real_dt;
        }
        if self.elapsed < self.interval {
            return false;
        }
        // Keep the phase but never emit a burst after a long stall.
        self.elapsed %= self.interval;

        let state = controller.state();
        sink.record(&MetricsRecord {
            active: state.active,
            baseline: state.baseline,
            multiplier: state.target_multiplier,
            applied: state.last_applied,
            interference: self.window_interference,
        });
        self.window_interference = 0;
        true
    }
}

impl Default for MetricsLogger {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_INTERVAL_SECS)
    }
}
