use std::f32::consts::FRAC_PI_4;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2-bit symbol; one of the four CQPSK constellation points.
///
/// Variants are named by their bit values followed by the C4FM deviation they map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dibit {
    #[display("00")]
    D00Plus1,
    #[display("01")]
    D01Plus3,
    #[display("10")]
    D10Minus1,
    #[display("11")]
    D11Minus3,
}

impl Dibit {
    pub const ALL: [Dibit; 4] = [
        Dibit::D00Plus1,
        Dibit::D01Plus3,
        Dibit::D10Minus1,
        Dibit::D11Minus3,
    ];

    /// Dibit from the low two bits of `value`.
    pub fn from_value(value: u8) -> Self {
        Self::ALL[usize::from(value & 0b11)]
    }

    /// First transmitted bit.
    pub fn bit1(self) -> bool {
        matches!(self, Self::D10Minus1 | Self::D11Minus3)
    }

    /// Second transmitted bit.
    pub fn bit2(self) -> bool {
        matches!(self, Self::D01Plus3 | Self::D11Minus3)
    }

    /// Value as the low two bits of an integer.
    pub fn low_value(self) -> u8 {
        self as u8
    }

    /// Value shifted into bits 3..2, used to build 4-bit trellis constellation points.
    pub fn high_value(self) -> u8 {
        (self as u8) << 2
    }

    /// Phase change in radians this dibit encodes in π/4-DQPSK.
    pub fn phase(self) -> f32 {
        match self {
            Self::D00Plus1 => FRAC_PI_4,
            Self::D01Plus3 => 3.0 * FRAC_PI_4,
            Self::D10Minus1 => -FRAC_PI_4,
            Self::D11Minus3 => -3.0 * FRAC_PI_4,
        }
    }

    /// The symbol received when the baseband spectrum is inverted.
    pub fn inverted(self) -> Self {
        match self {
            Self::D00Plus1 => Self::D10Minus1,
            Self::D01Plus3 => Self::D11Minus3,
            Self::D10Minus1 => Self::D00Plus1,
            Self::D11Minus3 => Self::D01Plus3,
        }
    }
}
