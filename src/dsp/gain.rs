//! Ramped gain node
//!
//! Level changes move the applied gain toward the target with a short linear
//! ramp instead of stepping, so wet/dry switches and volume changes are
//! click-free. Outside a ramp the node applies the target level exactly.

/// Ramp length for any level move, in seconds.
const RAMP_SECS: f64 = 0.005;

/// A gain stage whose level moves click-free toward its target.
#[derive(Debug, Clone)]
pub struct RampedGain {
    target: f32,
    current: f32,
    step: f32,
}

impl RampedGain {
    pub fn new(level: f32) -> Self {
        Self {
            target: level,
            current: level,
            step: 0.0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.step = (1.0 / (RAMP_SECS * sample_rate)) as f32;
        // Snap: prepare happens before any audio flows
        self.current = self.target;
    }

    /// Set the target level. The applied gain reaches it within the ramp.
    pub fn set_level(&mut self, level: f32) {
        self.target = level.max(0.0);
    }

    pub fn level(&self) -> f32 {
        self.target
    }

    /// Whether the applied gain has settled on the target.
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    pub fn reset(&mut self) {
        self.current = self.target;
    }

    pub fn process(&mut self, block: &mut [f32]) {
        if self.is_settled() {
            // Unity short-circuit
            if (self.target - 1.0).abs() < f32::EPSILON {
                return;
            }
            for sample in block.iter_mut() {
                *sample *= self.target;
            }
            return;
        }

        for sample in block.iter_mut() {
            if self.current < self.target {
                self.current = (self.current + self.step).min(self.target);
            } else {
                self.current = (self.current - self.step).max(self.target);
            }
            *sample *= self.current;
        }
    }
}
