/// The shared rate variable owned by the host.
///
/// Writes are best-effort and report nothing back; there is no ownership
/// token, so the controller can only infer who wrote a value from the value.
pub trait HostClock {
    fn get(&self) -> f32;
    fn set(&mut self, rate: f32);
}

impl<T: HostClock + ?Sized> HostClock for &mut T {
    fn get(&self) -> f32 {
        (**self).get()
    }

    fn set(&mut self, rate: f32) {
        (**self).set(rate)
    }
}

/// Plain in-memory rate variable that counts writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarClock {
    value: f32,
    writes: u64,
}

impl ScalarClock {
    pub fn new(value: f32) -> Self {
        Self { value, writes: 0 }
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Default for ScalarClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl HostClock for ScalarClock {
    fn get(&self) -> f32 {
        self.value
    }

    fn set(&mut self, rate: f32) {
        self.value = rate;
        self.writes += 1;
    }
}
