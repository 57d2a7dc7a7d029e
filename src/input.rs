/// Level-triggered control state, polled once per control per tick.
pub trait InputSource {
    fn is_engaged(&self, control: &str) -> bool;
}

impl<F> InputSource for F
where
    F: Fn(&str) -> bool,
{
    fn is_engaged(&self, control: &str) -> bool {
        self(control)
    }
}

/// Turns a polled level into a single event on the released-to-engaged transition.
#[derive(Debug, Clone, Default)]
pub struct InputEdgeDetector {
    held: bool,
}

impl InputEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, engaged: bool) -> bool {
        let fired = engaged && !self.held;
        self.held = engaged;
        fired
    }

    pub fn poll(&mut self, source: &(impl InputSource + ?Sized), control: &str) -> bool {
        self.update(source.is_engaged(control))
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn reset(&mut self) {
        self.held = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEvents {
    pub toggle_pressed: bool,
    pub toggle_held: bool,
    pub increase_pressed: bool,
    pub decrease_pressed: bool,
}
