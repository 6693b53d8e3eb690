//! Carrier and symbol synchronization for CQPSK (LSM) baseband.
//!
//! Samples flow through the [GardnerDetector], which rotates each one with the
//! [CostasLoop] phase estimate, interpolates the symbol centers and differentially
//! decodes them. The [Slicer] turns the resulting symbols into [Dibit]s.
mod costas;
mod demodulator;
mod dibit;
mod gardner;
mod slicer;

pub use costas::CostasLoop;
pub use demodulator::{Demodulator, DemodulatorConfig};
pub use dibit::Dibit;
pub use gardner::{interpolate, GardnerDetector};
pub use slicer::{slice, Slicer};
