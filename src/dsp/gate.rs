//! Noise gate node
//!
//! Attenuates the signal below a threshold so room noise between spoken
//! passages drops out of the wet path. Envelope follower with hysteresis to
//! prevent chattering, plus a hold timer and smoothed gain moves to avoid
//! clicks at the open/close edges.

use super::db_to_linear;

/// Gate parameters tuned for archived voice recordings.
#[derive(Debug, Clone, Copy)]
pub struct GateParams {
    /// Open threshold in dB (-80 to 0)
    pub threshold_db: f32,
    /// Gain smoothing attack in ms
    pub attack_ms: f32,
    /// Gain smoothing release in ms
    pub release_ms: f32,
    /// Time to stay open after the level falls below threshold, in ms
    pub hold_ms: f32,
    /// Attenuation depth when closed, in dB
    pub range_db: f32,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            threshold_db: -45.0,
            attack_ms: 2.0,
            release_ms: 80.0,
            hold_ms: 50.0,
            range_db: -30.0,
        }
    }
}

/// Noise gate over a mono stream.
#[derive(Debug, Clone)]
pub struct GateNode {
    params: GateParams,
    sample_rate: f64,
    /// Envelope follower value (linear)
    envelope: f32,
    /// Current applied gain (linear)
    current_gain: f32,
    /// Samples remaining in the hold window
    hold_counter: usize,
    open: bool,
    // Derived values
    threshold_open: f32,
    threshold_close: f32,
    floor_gain: f32,
    env_attack: f32,
    env_release: f32,
    gain_attack: f32,
    gain_release: f32,
    hold_samples: usize,
}

/// Hysteresis between open and close thresholds, in dB.
const HYSTERESIS_DB: f32 = 3.0;

/// Envelope follower time constants in ms.
const ENV_ATTACK_MS: f32 = 1.0;
const ENV_RELEASE_MS: f32 = 30.0;

fn smoothing_coeff(ms: f32, sample_rate: f64) -> f32 {
    (-1.0 / (ms as f64 * 0.001 * sample_rate)).exp() as f32
}

impl GateNode {
    pub fn new(params: GateParams) -> Self {
        let mut gate = Self {
            params,
            sample_rate: 44100.0,
            envelope: 0.0,
            current_gain: 0.0,
            hold_counter: 0,
            open: false,
            threshold_open: 0.0,
            threshold_close: 0.0,
            floor_gain: 0.0,
            env_attack: 0.0,
            env_release: 0.0,
            gain_attack: 0.0,
            gain_release: 0.0,
            hold_samples: 0,
        };
        gate.update_derived();
        gate
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_derived();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.current_gain = self.floor_gain;
        self.hold_counter = 0;
        self.open = false;
    }

    pub fn params(&self) -> &GateParams {
        &self.params
    }

    fn update_derived(&mut self) {
        self.threshold_open = db_to_linear(self.params.threshold_db);
        self.threshold_close = db_to_linear(self.params.threshold_db - HYSTERESIS_DB);
        self.floor_gain = db_to_linear(self.params.range_db);
        self.env_attack = smoothing_coeff(ENV_ATTACK_MS, self.sample_rate);
        self.env_release = smoothing_coeff(ENV_RELEASE_MS, self.sample_rate);
        self.gain_attack = smoothing_coeff(self.params.attack_ms, self.sample_rate);
        self.gain_release = smoothing_coeff(self.params.release_ms, self.sample_rate);
        self.hold_samples = (self.params.hold_ms as f64 * 0.001 * self.sample_rate) as usize;
    }

    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let level = sample.abs();

            // Envelope follower
            let coeff = if level > self.envelope {
                self.env_attack
            } else {
                self.env_release
            };
            self.envelope = level + coeff * (self.envelope - level);

            // Open/close decision with hysteresis and hold
            if self.envelope >= self.threshold_open {
                self.open = true;
                self.hold_counter = self.hold_samples;
            } else if self.envelope < self.threshold_close {
                if self.hold_counter > 0 {
                    self.hold_counter -= 1;
                } else {
                    self.open = false;
                }
            }

            // Smooth gain toward the open or floor level
            let (target, coeff) = if self.open {
                (1.0, self.gain_attack)
            } else {
                (self.floor_gain, self.gain_release)
            };
            self.current_gain = target + coeff * (self.current_gain - target);

            *sample *= self.current_gain;
        }
    }
}

impl Default for GateNode {
    fn default() -> Self {
        Self::new(GateParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(block: &[f32]) -> f32 {
        (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt()
    }

    fn tone(amplitude: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 8000.0;
                amplitude * (2.0 * std::f64::consts::PI * 240.0 * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_loud_signal_passes() {
        let mut gate = GateNode::default();
        gate.prepare(8000.0);
        let mut block = tone(0.5, 8000);
        let before = rms(&block);
        gate.process(&mut block);
        let after = rms(&block[4000..]);
        // Once open, the gate is transparent
        assert!((after - before).abs() / before < 0.1);
    }

    #[test]
    fn test_quiet_signal_attenuated() {
        let mut gate = GateNode::default();
        gate.prepare(8000.0);
        // -60 dBFS tone, well under the -45 dB threshold
        let mut block = tone(0.001, 8000);
        let before = rms(&block);
        gate.process(&mut block);
        let after = rms(&block[4000..]);
        // Closed gate applies roughly range_db (-30 dB) of attenuation
        assert!(after < before * 0.1);
    }

    #[test]
    fn test_gate_reopens_after_silence() {
        let mut gate = GateNode::default();
        gate.prepare(8000.0);

        let mut silence = vec![0.0f32; 8000];
        gate.process(&mut silence);

        let mut loud = tone(0.5, 8000);
        let before = rms(&loud);
        gate.process(&mut loud);
        let after = rms(&loud[4000..]);
        assert!((after - before).abs() / before < 0.1);
    }

    #[test]
    fn test_output_stays_finite() {
        let mut gate = GateNode::default();
        gate.prepare(8000.0);
        let mut block = tone(1.0, 4000);
        gate.process(&mut block);
        assert!(block.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_reset_closes_gate() {
        let mut gate = GateNode::default();
        gate.prepare(8000.0);
        let mut block = tone(0.5, 8000);
        gate.process(&mut block);

        gate.reset();
        assert!(!gate.open);
        assert_eq!(gate.hold_counter, 0);
    }
}
