pub const DEFAULT_PREVIEW_SECS: f32 = 1.5;

/// Countdown driving the fade-out of a value shown without being applied.
///
/// `tick` takes real elapsed time so that slowing the host rate does not
/// also slow the countdown.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTimer {
    remaining: f32,
    duration: f32,
}

impl PreviewTimer {
    pub fn new(duration: f32) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            DEFAULT_PREVIEW_SECS
        };
        Self {
            remaining: 0.0,
            duration,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.duration;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0.0;
    }

    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn fraction(&self) -> f32 {
        (self.remaining / self.duration).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl Default for PreviewTimer {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_SECS)
    }
}
