//! Second order Costas loop for CQPSK carrier recovery.
//!
//! The loop rotates every incoming sample by its phase estimate and updates the
//! estimate once per symbol from the differential symbol the timing recovery
//! produces.
use std::f32::consts::{FRAC_PI_4, SQRT_2, TAU};

use num_complex::Complex32;

/// Normalized loop bandwidth in radians per symbol.
const LOOP_BANDWIDTH: f32 = TAU / 400.0;
/// Critical damping.
const DAMPING: f32 = SQRT_2 / 2.0;

/// Gains of a critically damped 2nd order loop for `bandwidth`.
fn loop_gains(bandwidth: f32) -> (f32, f32) {
    let denominator = 1.0 + 2.0 * DAMPING * bandwidth + bandwidth * bandwidth;
    let alpha = (4.0 * DAMPING * bandwidth) / denominator;
    let beta = (4.0 * bandwidth * bandwidth) / denominator;
    (alpha, beta)
}

#[derive(Clone, Debug)]
pub struct CostasLoop {
    phase: f32,
    frequency: f32,
    max_frequency: f32,
    alpha: f32,
    beta: f32,
}

impl CostasLoop {
    /// Create a loop whose frequency estimate is clamped to `±max_frequency` radians
    /// per sample.
    pub fn new(max_frequency: f32) -> Self {
        let (alpha, beta) = loop_gains(LOOP_BANDWIDTH);
        Self {
            phase: 0.0,
            frequency: 0.0,
            max_frequency: max_frequency.abs(),
            alpha,
            beta,
        }
    }

    /// Current carrier frequency estimate in radians per sample.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advance the loop phase by one sample.
    pub fn increment(&mut self) {
        self.phase += self.frequency;
        self.wrap();
    }

    /// Unit vector that removes the current carrier estimate, including the fixed π/4
    /// offset between the CQPSK constellation and the loop reference.
    pub fn mixer(&self) -> Complex32 {
        Complex32::from_polar(1.0, -(self.phase + FRAC_PI_4))
    }

    /// Update the loop from a decided, magnitude normalized differential symbol.
    pub fn receive(&mut self, symbol: Complex32) {
        let error = phase_error(symbol);
        if !error.is_finite() {
            return;
        }
        self.frequency += self.beta * error;
        self.phase += self.frequency + self.alpha * error;
        self.wrap();
        self.frequency = self.frequency.clamp(-self.max_frequency, self.max_frequency);
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = 0.0;
    }

    fn wrap(&mut self) {
        while self.phase > TAU {
            self.phase -= TAU;
        }
        while self.phase < -TAU {
            self.phase += TAU;
        }
    }
}

/// Early/late error for a symbol that ideally sits on a diagonal.
///
/// In the first and third quadrants a symbol late in phase has a larger imaginary
/// component; in the second and fourth the real component grows instead.
fn phase_error(symbol: Complex32) -> f32 {
    if (symbol.re >= 0.0) == (symbol.im >= 0.0) {
        symbol.im.abs() - symbol.re.abs()
    } else {
        symbol.re.abs() - symbol.im.abs()
    }
}
