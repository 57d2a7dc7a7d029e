//! Arbitration of the host's shared rate variable.
//!
//! The controller never holds a lock on the variable. It remembers the last
//! value it wrote and treats any observed value further than the reconcile
//! epsilon from that as a write by someone else.

use crate::host::HostClock;
use crate::preset::{Direction, PresetSet};
use crate::preview::PreviewTimer;
use crate::settings::{AdjustMode, OwnershipPolicy, Settings};
use tracing::{debug, info};

// Interference reports beyond this stay counted but are not queued.
const PENDING_INTERFERENCE_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    pub active: bool,
    /// Rate the host itself intends to run at, as last observed.
    pub baseline: f32,
    /// Value this controller last wrote (or accepted) on the host.
    pub last_applied: f32,
    pub target_multiplier: f32,
}

/// Read-only view handed to the overlay each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub active: bool,
    pub current_percentage: f32,
    pub preview_fraction: f32,
}

impl Snapshot {
    pub fn rounded_percentage(&self) -> i32 {
        self.current_percentage.round() as i32
    }

    pub fn is_visible(&self) -> bool {
        self.active || self.preview_fraction > 0.0
    }
}

/// A host value that did not match what the controller last wrote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interference {
    pub observed: f32,
    pub expected: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOutcome {
    pub observed: f32,
    pub written: Option<f32>,
    pub interference: Option<Interference>,
}

#[derive(Debug, Clone)]
pub struct RateController {
    state: ClockState,
    adjust: AdjustMode,
    presets: PresetSet,
    preview: PreviewTimer,
    policy: OwnershipPolicy,
    scale_factor: f32,
    reconcile_epsilon: f32,
    preset_epsilon: f32,
    capture_epsilon: f32,
    neutral_rate: f32,
    // Set when the in-charge guard tolerates a host value below the target.
    host_override: bool,
    interference_count: u64,
    // Observed during toggles, adjusts and reconciles; drained by the session.
    pending: Vec<Interference>,
}

impl RateController {
    pub fn new(settings: &Settings, initial_rate: f32) -> Self {
        let neutral_rate = settings.neutral_rate;
        let baseline = sanitize_baseline(initial_rate, neutral_rate);
        let target_multiplier = match settings.adjust {
            AdjustMode::Scale => (settings.initial_percent / 100.0).clamp(0.0, 1.0),
            AdjustMode::Presets => (settings.initial_percent / 100.0).max(0.0),
        };
        Self {
            state: ClockState {
                active: false,
                baseline,
                last_applied: baseline,
                target_multiplier,
            },
            adjust: settings.adjust,
            presets: settings.presets.clone(),
            preview: PreviewTimer::new(settings.preview_secs),
            policy: settings.policy,
            scale_factor: settings.scale_factor,
            reconcile_epsilon: settings.reconcile_epsilon,
            preset_epsilon: settings.preset_epsilon,
            capture_epsilon: settings.capture_epsilon,
            neutral_rate,
            host_override: false,
            interference_count: 0,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn multiplier(&self) -> f32 {
        self.state.target_multiplier
    }

    pub fn policy(&self) -> OwnershipPolicy {
        self.policy
    }

    pub fn adjust_mode(&self) -> AdjustMode {
        self.adjust
    }

    pub fn preview(&self) -> &PreviewTimer {
        &self.preview
    }

    pub fn interference_count(&self) -> u64 {
        self.interference_count
    }

    /// External changes seen since the last call, whichever operation saw them.
    pub fn take_interference(&mut self) -> Vec<Interference> {
        std::mem::take(&mut self.pending)
    }

    pub fn neutral_rate(&self) -> f32 {
        self.neutral_rate
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.state.active,
            current_percentage: self.state.target_multiplier * 100.0,
            preview_fraction: if self.state.active {
                0.0
            } else {
                self.preview.fraction()
            },
        }
    }

    /// Rate the host should be running at right now.
    pub fn target(&self) -> f32 {
        let m = if self.state.active {
            self.state.target_multiplier
        } else {
            1.0
        };
        clamp_rate(self.state.baseline * m)
    }

    pub fn on_toggle_pressed<H: HostClock + ?Sized>(&mut self, host: &mut H) {
        self.set_active(!self.state.active, host);
    }

    /// Returns false when the controller was already in the requested state.
    pub fn set_active<H: HostClock + ?Sized>(&mut self, active: bool, host: &mut H) -> bool {
        if active == self.state.active {
            return false;
        }
        let observed = host.get();

        if active {
            // Observing a value that already looks slowed (rapid re-toggle)
            // must not become the baseline, or the slowdown compounds.
            let slowed = self.state.target_multiplier * self.neutral_rate;
            self.state.baseline =
                if !observed.is_finite() || (observed - slowed).abs() < self.capture_epsilon {
                    self.neutral_rate
                } else {
                    clamp_rate(observed)
                };
            self.state.last_applied = sanitize_baseline(observed, self.neutral_rate);
            self.state.active = true;
            self.preview.cancel();
            self.host_override = false;
            self.enforce(host, observed);
            info!(
                multiplier = self.state.target_multiplier,
                baseline = self.state.baseline,
                policy = self.policy.as_str(),
                "rate control activated"
            );
        } else {
            self.observe(observed);
            if self.host_override {
                // The host drove the rate below our target; releasing must not undo that.
                self.state.baseline = self.state.last_applied;
            }
            self.state.active = false;
            self.host_override = false;
            self.enforce(host, observed);
            info!(baseline = self.state.baseline, "rate control released");
        }
        true
    }

    pub fn on_adjust_pressed<H: HostClock + ?Sized>(
        &mut self,
        direction: Direction,
        host: &mut H,
    ) -> bool {
        let current = self.state.target_multiplier;
        let next = match self.adjust {
            AdjustMode::Scale => {
                let f = self.scale_factor;
                let v = match direction {
                    Direction::Increase => current / f,
                    Direction::Decrease => current * f,
                };
                clamp_unit(v)
            }
            AdjustMode::Presets => {
                match self
                    .presets
                    .next_with_epsilon(current * 100.0, direction, self.preset_epsilon)
                {
                    Some(pct) => pct / 100.0,
                    None => return false,
                }
            }
        };
        if next == current {
            return false;
        }
        self.state.target_multiplier = next;
        debug!(
            direction = direction.as_str(),
            multiplier = next,
            active = self.state.active,
            "multiplier adjusted"
        );

        if self.state.active {
            self.reconcile(host);
        } else {
            self.preview.start();
        }
        true
    }

    /// Per-tick step: absorb foreign writes, then write the target if needed.
    pub fn reconcile<H: HostClock + ?Sized>(&mut self, host: &mut H) -> ReconcileOutcome {
        let observed = host.get();
        let interference = self.observe(observed);
        let written = self.enforce(host, observed);
        ReconcileOutcome {
            observed,
            written,
            interference,
        }
    }

    /// Decays the preview with unscaled elapsed time.
    pub fn advance(&mut self, real_dt: f32) {
        self.preview.tick(real_dt);
    }

    fn observe(&mut self, observed: f32) -> Option<Interference> {
        let foreign = !observed.is_finite()
            || (observed - self.state.last_applied).abs() > self.reconcile_epsilon;
        if !foreign {
            return None;
        }

        let interference = Interference {
            observed,
            expected: self.state.last_applied,
        };
        self.interference_count += 1;
        if self.pending.len() < PENDING_INTERFERENCE_LIMIT {
            self.pending.push(interference);
        }

        let keep_baseline = self.state.active
            && matches!(
                self.policy,
                OwnershipPolicy::InCharge | OwnershipPolicy::Overwrite
            );
        if !keep_baseline {
            self.state.baseline = sanitize_baseline(observed, self.neutral_rate);
        }
        if self.state.active && self.policy == OwnershipPolicy::InCharge {
            self.host_override = true;
        }
        if observed.is_finite() {
            self.state.last_applied = clamp_rate(observed);
        }

        debug!(
            observed,
            expected = interference.expected,
            baseline = self.state.baseline,
            policy = self.policy.as_str(),
            "external rate change"
        );
        Some(interference)
    }

    fn enforce<H: HostClock + ?Sized>(&mut self, host: &mut H, observed: f32) -> Option<f32> {
        let target = self.target();
        let eps = self.reconcile_epsilon;
        let needs_write = if !observed.is_finite() {
            true
        } else if self.state.active && self.policy == OwnershipPolicy::InCharge && self.host_override
        {
            observed > target + eps
        } else {
            (observed - target).abs() > eps
        };
        if !needs_write {
            return None;
        }

        host.set(target);
        self.state.last_applied = target;
        self.host_override = false;
        Some(target)
    }
}

fn clamp_rate(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

fn sanitize_baseline(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { fallback }
}
