//! Error detection and correction codes used by P25 Phase 1.
//!
//! Every decoder reports its outcome as an [Integrity] value. Transmission errors are
//! never reported as [crate::Error]s.
mod bch;
mod berlekamp_massey;
mod crc;
mod golay;
mod hamming;
mod interleave;
mod reed_solomon;
mod trellis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use bch::Bch63_16;
pub use berlekamp_massey::{BerlekampMassey, GaloisField};
pub use crc::{
    check_ccitt80, check_crc9, correct_ccitt80, crc9, packet_crc32, CCITT_80, PACKET_CRC32,
};
pub use golay::{encode_18, encode_24, Golay};
pub use hamming::{data_10, decode_10, encode_10};
pub use interleave::{deinterleave, interleave, BLOCK_BITS, DATA_INTERLEAVE};
pub use reed_solomon::HexbitCode;
pub use trellis::{Trellis, TrellisRate};

/// The possible integrity dispositions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Integrity {
    /// Data did not require correction.
    Ok,
    /// Data was successfully corrected. Carries the number of bits or symbols repaired.
    Corrected(usize),
    /// Not correctable due to too many errors; the data is left as received.
    Uncorrectable,
    /// Check failed and no correction was possible or attempted.
    Failed,
}

impl Integrity {
    /// Return `true` if [Self::Ok] or [Self::Corrected]. Any other value will return `false`.
    pub fn ok(&self) -> bool {
        matches!(self, Self::Ok | Self::Corrected(_))
    }

    /// Number of corrected errors, zero unless [Self::Corrected].
    pub fn corrections(&self) -> usize {
        match self {
            Self::Corrected(num) => *num,
            _ => 0,
        }
    }
}
