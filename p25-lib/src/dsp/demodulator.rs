use std::f32::consts::TAU;

use num_complex::Complex32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::{slice, CostasLoop, Dibit, GardnerDetector};
use crate::{Error, Result};

/// Demodulator settings.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DemodulatorConfig {
    /// Baseband sample rate in Hz.
    #[builder(default = 48_000.0)]
    pub sample_rate: f32,
    /// P25 Phase 1 runs at 4800 symbols per second.
    #[builder(default = 4_800.0)]
    pub symbol_rate: f32,
    /// Largest carrier offset, in Hz, the Costas loop may track.
    #[builder(default = 1_200.0)]
    pub max_carrier_offset: f32,
    /// Timing loop proportional gain.
    #[builder(default = 0.05)]
    pub gain_mu: f32,
}

impl Default for DemodulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DemodulatorConfig {
    pub fn samples_per_symbol(&self) -> f32 {
        self.sample_rate / self.symbol_rate
    }

    /// Costas loop frequency limit in radians per sample.
    pub fn max_loop_frequency(&self) -> f32 {
        TAU * self.max_carrier_offset / self.sample_rate
    }

    /// # Errors
    /// [Error::InvalidConfig] for rates that are not positive or that leave fewer than
    /// two samples per symbol.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0 && self.symbol_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample rate {} and symbol rate {} must be positive",
                self.sample_rate, self.symbol_rate
            )));
        }
        if self.samples_per_symbol() < 2.0 {
            return Err(Error::InvalidConfig(format!(
                "{} samples per symbol is below the 2 the timing detector requires",
                self.samples_per_symbol()
            )));
        }
        if !(self.gain_mu > 0.0 && self.gain_mu < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "timing gain {} must be in (0, 1)",
                self.gain_mu
            )));
        }
        Ok(())
    }
}

/// Complex baseband samples in, dibits out.
///
/// The first dibit is emitted before a reference symbol exists and is meaningless;
/// every following dibit corresponds to the previous symbol period. Dibits are sliced
/// with the normal table; inverted spectrum handling belongs to the framer.
#[derive(Clone, Debug)]
pub struct Demodulator {
    gardner: GardnerDetector,
}

impl Demodulator {
    /// # Errors
    /// See [DemodulatorConfig::validate].
    pub fn new(config: &DemodulatorConfig) -> Result<Self> {
        config.validate()?;
        let costas = CostasLoop::new(config.max_loop_frequency());
        Ok(Self {
            gardner: GardnerDetector::new(config.samples_per_symbol(), config.gain_mu, costas),
        })
    }

    /// Carrier frequency estimate in radians per sample.
    pub fn carrier_frequency(&self) -> f32 {
        self.gardner.costas().frequency()
    }

    pub fn samples_per_symbol(&self) -> f32 {
        self.gardner.omega()
    }

    /// Sample in, rotated differential symbol out, for callers that slice themselves.
    pub fn receive_symbol(&mut self, sample: Complex32) -> Option<Complex32> {
        self.gardner.receive(sample)
    }

    pub fn receive(&mut self, sample: Complex32) -> Option<Dibit> {
        self.gardner.receive(sample).map(slice)
    }
}
