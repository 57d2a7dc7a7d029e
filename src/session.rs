use crate::controller::{RateController, ReconcileOutcome, Snapshot};
use crate::host::HostClock;
use crate::input::{InputEdgeDetector, InputEvents, InputSource};
use crate::metrics::{MetricsLogger, MetricsSink, TracingSink};
use crate::preset::Direction;
use crate::settings::{ActivationMode, Settings};
use tracing::{debug, info};

/// Everything the host drives once per frame.
///
/// Ordering within a tick is fixed: input, reconcile, preview decay, metrics.
pub struct RateSession<S: MetricsSink = TracingSink> {
    controller: RateController,
    activation: ActivationMode,
    toggle_control: String,
    increase_control: String,
    decrease_control: String,
    toggle: InputEdgeDetector,
    increase: InputEdgeDetector,
    decrease: InputEdgeDetector,
    metrics: MetricsLogger,
    sink: S,
    reconcile_epsilon: f32,
    ticks: u64,
    last_outcome: Option<ReconcileOutcome>,
}

impl RateSession<TracingSink> {
    pub fn new<H: HostClock + ?Sized>(settings: &Settings, host: &H) -> Self {
        Self::with_sink(settings, host, TracingSink)
    }
}

impl<S: MetricsSink> RateSession<S> {
    pub fn with_sink<H: HostClock + ?Sized>(settings: &Settings, host: &H, sink: S) -> Self {
        Self {
            controller: RateController::new(settings, host.get()),
            activation: settings.activation,
            toggle_control: settings.toggle_control.clone(),
            increase_control: settings.increase_control.clone(),
            decrease_control: settings.decrease_control.clone(),
            toggle: InputEdgeDetector::new(),
            increase: InputEdgeDetector::new(),
            decrease: InputEdgeDetector::new(),
            metrics: MetricsLogger::new(settings.metrics_interval_secs),
            sink,
            reconcile_epsilon: settings.reconcile_epsilon,
            ticks: 0,
            last_outcome: None,
        }
    }

    pub fn controller(&self) -> &RateController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn activation(&self) -> ActivationMode {
        self.activation
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_outcome(&self) -> Option<ReconcileOutcome> {
        self.last_outcome
    }

    pub fn snapshot(&self) -> Snapshot {
        self.controller.snapshot()
    }

    pub fn poll_input(&mut self, input: &(impl InputSource + ?Sized)) -> InputEvents {
        InputEvents {
            toggle_pressed: self.toggle.poll(input, &self.toggle_control),
            toggle_held: self.toggle.is_held(),
            increase_pressed: self.increase.poll(input, &self.increase_control),
            decrease_pressed: self.decrease.poll(input, &self.decrease_control),
        }
    }

    pub fn handle_input<H: HostClock + ?Sized>(&mut self, events: InputEvents, host: &mut H) {
        match self.activation {
            ActivationMode::Toggle => {
                if events.toggle_pressed {
                    self.controller.on_toggle_pressed(host);
                }
            }
            ActivationMode::Hold => {
                if self.controller.set_active(events.toggle_held, host) {
                    debug!(active = events.toggle_held, "hold control changed state");
                }
            }
        }
        if events.increase_pressed {
            self.adjust(Direction::Increase, host);
        }
        if events.decrease_pressed {
            self.adjust(Direction::Decrease, host);
        }
    }

    fn adjust<H: HostClock + ?Sized>(&mut self, direction: Direction, host: &mut H) {
        if !self.controller.on_adjust_pressed(direction, host) {
            debug!(
                direction = direction.as_str(),
                multiplier = self.controller.multiplier(),
                "adjust press at limit, ignored"
            );
        }
    }

    fn forward_interference(&mut self) {
        for event in self.controller.take_interference() {
            self.metrics.note_interference(&event, &mut self.sink);
        }
    }

    /// The per-frame entry point. `real_dt` is unscaled wall-clock time.
    pub fn tick<H: HostClock + ?Sized>(
        &mut self,
        host: &mut H,
        input: &(impl InputSource + ?Sized),
        real_dt: f32,
    ) -> Snapshot {
        let events = self.poll_input(input);
        self.handle_input(events, host);

        self.last_outcome = Some(self.controller.reconcile(host));
        self.forward_interference();

        self.controller.advance(real_dt);
        self.metrics.tick(real_dt, &self.controller, &mut self.sink);
        self.ticks += 1;
        self.controller.snapshot()
    }

    /// Releases control and leaves the host at its neutral rate.
    pub fn shutdown<H: HostClock + ?Sized>(&mut self, host: &mut H) {
        self.controller.set_active(false, host);
        self.forward_interference();
        let neutral = self.controller.neutral_rate();
        let current = host.get();
        if !current.is_finite() || (current - neutral).abs() > self.reconcile_epsilon {
            host.set(neutral);
        }
        self.toggle.reset();
        self.increase.reset();
        self.decrease.reset();
        info!(rate = neutral, ticks = self.ticks, "rate control shut down");
    }
}
