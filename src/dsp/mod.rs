//! Signal-processing nodes for the noise-reduction graph
//!
//! Mono block processors with the prepare/reset/process-in-place contract.
//! The graph wires them into a fixed topology; only their parameter values
//! change at runtime.

mod biquad;
mod gain;
mod gate;

pub use biquad::{Biquad, FilterMode};
pub use gain::RampedGain;
pub use gate::{GateNode, GateParams};

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels. Returns -inf for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}
