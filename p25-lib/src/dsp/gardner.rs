//! Gardner symbol timing recovery with cubic interpolation.
use std::f32::consts::FRAC_PI_4;

use num_complex::Complex32;

use super::CostasLoop;

/// Allowed deviation of the samples per symbol estimate from nominal.
const OMEGA_RELATIVE_LIMIT: f32 = 0.005;
const TAPS: usize = 4;

/// Ring length holding two symbols of history and every tap the center window can
/// reach, which is half a symbol past the oldest sample plus one for a `mu` carry.
fn ring_length(samples_per_symbol: f32) -> usize {
    let twice_sps = 2 * samples_per_symbol.ceil() as usize;
    let half_sps = ((samples_per_symbol + OMEGA_RELATIVE_LIMIT) / 2.0).floor() as usize + 1;
    twice_sps.max(half_sps + TAPS)
}

/// Catmull-Rom interpolation between `taps[1]` and `taps[2]` at fraction `mu`.
pub fn interpolate(taps: &[Complex32], mu: f32) -> Complex32 {
    let (h0, h1, h2, h3) = (taps[0], taps[1], taps[2], taps[3]);
    let a0 = h0 * -0.5 + h1 * 1.5 - h2 * 1.5 + h3 * 0.5;
    let a1 = h0 - h1 * 2.5 + h2 * 2.0 - h3 * 0.5;
    let a2 = h0 * -0.5 + h2 * 0.5;
    let a3 = h1;
    ((a0 * mu + a1) * mu + a2) * mu + a3
}

fn normalize(value: Complex32) -> Complex32 {
    let magnitude = value.norm();
    if magnitude > 0.0 && magnitude.is_finite() {
        value / magnitude
    } else {
        Complex32::new(0.0, 0.0)
    }
}

/// Timing error detector and interpolator feeding a [CostasLoop].
///
/// Produces one differential symbol, rotated by +π/4, per symbol period.
#[derive(Clone, Debug)]
pub struct GardnerDetector {
    costas: CostasLoop,
    delay_line: Vec<Complex32>,
    ring: usize,
    pointer: usize,
    mu: f32,
    omega: f32,
    omega_mid: f32,
    gain_mu: f32,
    gain_omega: f32,
    previous_center: Complex32,
    previous_middle: Complex32,
    previous_symbol: Complex32,
}

impl GardnerDetector {
    pub fn new(samples_per_symbol: f32, gain_mu: f32, costas: CostasLoop) -> Self {
        let ring = ring_length(samples_per_symbol);
        Self {
            costas,
            delay_line: vec![Complex32::new(0.0, 0.0); 2 * ring],
            ring,
            pointer: 0,
            mu: samples_per_symbol,
            omega: samples_per_symbol,
            omega_mid: samples_per_symbol,
            gain_mu,
            gain_omega: 0.1 * gain_mu * gain_mu,
            previous_center: Complex32::new(0.0, 0.0),
            previous_middle: Complex32::new(0.0, 0.0),
            previous_symbol: Complex32::new(0.0, 0.0),
        }
    }

    pub fn costas(&self) -> &CostasLoop {
        &self.costas
    }

    /// Current samples per symbol estimate.
    pub fn omega(&self) -> f32 {
        self.omega
    }

    /// Consume one baseband sample, returning a symbol when a symbol period elapses.
    pub fn receive(&mut self, sample: Complex32) -> Option<Complex32> {
        self.mu -= 1.0;

        self.costas.increment();
        let mixed = sample * self.costas.mixer();

        // duplicate writes keep 4-tap windows contiguous across the wrap
        self.delay_line[self.pointer] = mixed;
        self.delay_line[self.pointer + self.ring] = mixed;
        self.pointer = (self.pointer + 1) % self.ring;

        if self.mu > 1.0 {
            return None;
        }

        let half_omega = self.omega / 2.0;
        let mut half_sps = half_omega.floor() as usize;
        let mut half_mu = self.mu + half_omega - half_sps as f32;
        if half_mu > 1.0 {
            half_mu -= 1.0;
            half_sps += 1;
        }

        let middle = interpolate(&self.delay_line[self.pointer..], self.mu);
        let center = interpolate(&self.delay_line[self.pointer + half_sps..], half_mu);

        let middle_symbol = normalize(middle * self.previous_middle.conj());
        let center_symbol = normalize(center * self.previous_center.conj());

        let mut error = (self.previous_symbol.re - center_symbol.re) * middle_symbol.re
            + (self.previous_symbol.im - center_symbol.im) * middle_symbol.im;
        if error.is_nan() {
            error = 0.0;
        }
        let error = error.clamp(-1.0, 1.0);

        self.omega += self.gain_omega * error;
        self.omega = self.omega_mid
            + (self.omega - self.omega_mid).clamp(-OMEGA_RELATIVE_LIMIT, OMEGA_RELATIVE_LIMIT);
        self.mu += self.omega + self.gain_mu * error;

        self.previous_center = center;
        self.previous_middle = middle;
        self.previous_symbol = center_symbol;

        self.costas.receive(center_symbol);

        Some(center_symbol * Complex32::from_polar(1.0, FRAC_PI_4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    #[test]
    fn interpolate_hits_taps() {
        let taps = [
            Complex32::new(0.0, 1.0),
            Complex32::new(1.0, 0.0),
            Complex32::new(2.0, -1.0),
            Complex32::new(3.0, 0.5),
        ];
        assert!((interpolate(&taps, 0.0) - taps[1]).norm() < 1e-6);
        assert!((interpolate(&taps, 1.0) - taps[2]).norm() < 1e-6);
    }

    #[test]
    fn interpolate_linear_ramp() {
        let taps: Vec<Complex32> = (0..4).map(|v| Complex32::new(v as f32, 0.0)).collect();
        let zult = interpolate(&taps, 0.25);
        assert!((zult.re - 1.25).abs() < 1e-6, "got {zult}");
    }

    #[test]
    fn one_symbol_per_period() {
        let mut gardner = GardnerDetector::new(10.0, 0.05, CostasLoop::new(0.1));
        let emitted = (0..1000)
            .filter_map(|i| gardner.receive(Complex32::from_polar(1.0, i as f32 * 0.01)))
            .count();
        assert!((99..=101).contains(&emitted), "emitted {emitted}");
    }

    #[test_case(2.0 ; "two")]
    #[test_case(2.5 ; "two and a half")]
    #[test_case(3.0 ; "three")]
    fn lowest_rates_stay_in_bounds(samples_per_symbol: f32) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut gardner = GardnerDetector::new(samples_per_symbol, 0.05, CostasLoop::new(0.5));
        let emitted = (0..4000)
            .filter_map(|_| {
                gardner.receive(Complex32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            })
            .count();
        let expected = 4000.0 / samples_per_symbol;
        assert!(
            (emitted as f32 - expected).abs() < expected * 0.05,
            "emitted {emitted}"
        );
    }

    #[test]
    fn ring_covers_center_window() {
        for sps in [2.0f32, 2.2, 3.0, 4.8, 10.0, 20.0] {
            let ring = ring_length(sps);
            let half_sps = ((sps + OMEGA_RELATIVE_LIMIT) / 2.0).floor() as usize + 1;
            assert!(half_sps + TAPS <= ring, "sps {sps}");
        }
        assert_eq!(ring_length(10.0), 20);
    }

    #[test]
    fn tolerates_nan_input() {
        let mut gardner = GardnerDetector::new(10.0, 0.05, CostasLoop::new(0.1));
        for _ in 0..100 {
            gardner.receive(Complex32::new(f32::NAN, f32::NAN));
        }
        assert!((gardner.omega() - 10.0).abs() <= OMEGA_RELATIVE_LIMIT);
        assert!(gardner.costas().frequency().is_finite());
    }
}
