//! Biquad filter node (low-pass / high-pass)
//!
//! RBJ audio-EQ-cookbook coefficients, Butterworth Q. Cutoff changes update
//! coefficients in place; filter history carries across the change so a live
//! frequency sweep produces no discontinuity.

/// Filter response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

/// Biquad coefficients, normalized by a0.
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy)]
struct Coeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coeffs {
    fn calculate(mode: FilterMode, frequency: f64, q: f64, sample_rate: f64) -> Self {
        // Keep cutoff below Nyquist to avoid coefficient blow-up
        let frequency = frequency.min(sample_rate * 0.49).max(1.0);
        let w0 = 2.0 * std::f64::consts::PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match mode {
            FilterMode::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterMode::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        Coeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// One biquad filter over a mono stream.
#[derive(Debug, Clone)]
pub struct Biquad {
    mode: FilterMode,
    frequency: f64,
    q: f64,
    sample_rate: f64,
    coeffs: Coeffs,
    // Direct form 1 state
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Butterworth Q
    pub const DEFAULT_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

    pub fn new(mode: FilterMode, frequency: f64) -> Self {
        let sample_rate = 44100.0;
        Self {
            mode,
            frequency,
            q: Self::DEFAULT_Q,
            sample_rate,
            coeffs: Coeffs::calculate(mode, frequency, Self::DEFAULT_Q, sample_rate),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_coeffs();
        self.reset();
    }

    /// Clear filter history (on session teardown, not on parameter changes).
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Move the cutoff. Takes effect on the next sample; history is kept.
    pub fn set_frequency(&mut self, hz: f64) {
        self.frequency = hz;
        self.update_coeffs();
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    fn update_coeffs(&mut self) {
        self.coeffs = Coeffs::calculate(self.mode, self.frequency, self.q, self.sample_rate);
    }

    #[inline]
    fn process_sample(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample as f64) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rms(block: &[f32]) -> f32 {
        (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt()
    }

    fn sine_block(frequency: f64, sample_rate: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_highpass_kills_dc() {
        let mut filter = Biquad::new(FilterMode::HighPass, 100.0);
        filter.prepare(8000.0);
        let mut block = vec![1.0f32; 8000];
        filter.process(&mut block);
        // After settling, DC should be gone
        assert!(rms(&block[4000..]) < 0.01);
    }

    #[test]
    fn test_highpass_passes_high_frequency() {
        let mut filter = Biquad::new(FilterMode::HighPass, 100.0);
        filter.prepare(8000.0);
        let mut block = sine_block(2000.0, 8000.0, 8000);
        let before = rms(&block);
        filter.process(&mut block);
        let after = rms(&block[4000..]);
        assert_abs_diff_eq!(after, before, epsilon = 0.1);
    }

    #[test]
    fn test_lowpass_attenuates_near_nyquist() {
        let mut filter = Biquad::new(FilterMode::LowPass, 300.0);
        filter.prepare(8000.0);
        let mut block = sine_block(3500.0, 8000.0, 8000);
        filter.process(&mut block);
        assert!(rms(&block[4000..]) < 0.05);
    }

    #[test]
    fn test_lowpass_passes_low_frequency() {
        let mut filter = Biquad::new(FilterMode::LowPass, 2000.0);
        filter.prepare(8000.0);
        let mut block = sine_block(100.0, 8000.0, 8000);
        let before = rms(&block);
        filter.process(&mut block);
        let after = rms(&block[4000..]);
        assert_abs_diff_eq!(after, before, epsilon = 0.1);
    }

    #[test]
    fn test_set_frequency_keeps_history() {
        let mut filter = Biquad::new(FilterMode::LowPass, 1000.0);
        filter.prepare(8000.0);
        let mut block = sine_block(200.0, 8000.0, 4000);
        filter.process(&mut block);

        let before = filter.y1;
        filter.set_frequency(2000.0);
        // No reset: state survives the cutoff change
        assert_eq!(filter.y1, before);
        assert_eq!(filter.frequency(), 2000.0);
    }

    #[test]
    fn test_cutoff_clamped_below_nyquist() {
        let mut filter = Biquad::new(FilterMode::LowPass, 20000.0);
        filter.prepare(8000.0);
        let mut block = sine_block(1000.0, 8000.0, 4000);
        filter.process(&mut block);
        // Must stay finite even with cutoff above Nyquist of the stream
        assert!(block.iter().all(|s| s.is_finite()));
    }
}
