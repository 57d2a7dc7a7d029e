//! A stand-in host for the demo: it owns the rate variable and changes it on
//! its own, the way a game does around pauses and cutscenes.

use crate::host::HostClock;

const HOST_DEFAULT_RATE: f32 = 1.0;
const CUTSCENE_SECS: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Running,
    Paused,
    Cutscene,
}

impl HostPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Cutscene => "cutscene",
        }
    }
}

struct Chaos {
    rng: fastrand::Rng,
    mean_gap_secs: f32,
    next_in: f32,
}

impl Chaos {
    fn schedule(&mut self) {
        self.next_in = self.mean_gap_secs * (0.5 + self.rng.f32());
    }
}

pub struct SimulatedHost {
    rate: f32,
    paused: bool,
    cutscene_left: f32,
    chaos: Option<Chaos>,
    sim_time: f64,
    real_time: f64,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            rate: HOST_DEFAULT_RATE,
            paused: false,
            cutscene_left: 0.0,
            chaos: None,
            sim_time: 0.0,
            real_time: 0.0,
        }
    }

    /// Triggers cutscenes at random intervals around `mean_gap_secs`.
    pub fn with_chaos(mut self, seed: Option<u64>, mean_gap_secs: f32) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        let mut chaos = Chaos {
            rng,
            mean_gap_secs: mean_gap_secs.max(0.5),
            next_in: 0.0,
        };
        chaos.schedule();
        self.chaos = Some(chaos);
        self
    }

    pub fn phase(&self) -> HostPhase {
        if self.paused {
            HostPhase::Paused
        } else if self.cutscene_left > 0.0 {
            HostPhase::Cutscene
        } else {
            HostPhase::Running
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        // Games resume at their own default, not at whatever was set before.
        self.rate = if self.paused { 0.0 } else { HOST_DEFAULT_RATE };
    }

    pub fn start_cutscene(&mut self) {
        if !self.paused {
            self.cutscene_left = CUTSCENE_SECS;
        }
    }

    /// The host's own frame logic, run before the controller's tick.
    pub fn update(&mut self, real_dt: f32) {
        if let Some(chaos) = self.chaos.as_mut() {
            chaos.next_in -= real_dt;
            if chaos.next_in <= 0.0 {
                chaos.schedule();
                if !self.paused {
                    self.cutscene_left = CUTSCENE_SECS;
                }
            }
        }
        if self.cutscene_left > 0.0 && !self.paused {
            self.rate = HOST_DEFAULT_RATE;
            self.cutscene_left = (self.cutscene_left - real_dt).max(0.0);
        }
        self.real_time += real_dt as f64;
        self.sim_time += (real_dt * self.rate.max(0.0)) as f64;
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn real_time(&self) -> f64 {
        self.real_time
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SimulatedHost {
    fn get(&self) -> f32 {
        self.rate
    }

    fn set(&mut self, rate: f32) {
        self.rate = rate;
    }
}
