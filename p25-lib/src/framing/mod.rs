//! Frame synchronization and data unit assembly.
//!
//! A [MessageFramer] watches the dibit stream for the frame sync pattern. Each match
//! activates one of two assemblers, which collect the frame bits, skip the embedded
//! status symbols and walk the data unit state machine as the frame fills up, handing
//! decoded [Message](crate::message::Message)s to a [Listener](crate::message::Listener).
mod assembler;
mod framer;
mod pipeline;
mod synchronizer;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{Error, Result};

pub use framer::{FramerStats, MessageFramer, ASSEMBLERS};
pub use pipeline::{decode, InputFormat, Messages};
pub use synchronizer::SyncDetector;

/// 48-bit frame sync, 24 dibits of +3 and -3 deviation.
pub const SYNC_PATTERN: u64 = 0x5575_F5FF_77FF;
pub const SYNC_BITS: usize = 48;

/// Data unit identifier carried in the NID, as seen by message consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataUnitId {
    #[display("HDU")]
    Hdu,
    #[display("TDU")]
    Tdu,
    #[display("LDU1")]
    Ldu1,
    #[display("TSBK")]
    Tsbk,
    #[display("LDU2")]
    Ldu2,
    #[display("PDU")]
    Pdu,
    #[display("TDULC")]
    Tdulc,
    #[display("UNK")]
    Unknown,
}

impl DataUnitId {
    /// The 4-bit NID value, `None` for [Self::Unknown].
    pub fn value(self) -> Option<u8> {
        match self {
            Self::Hdu => Some(0x0),
            Self::Tdu => Some(0x3),
            Self::Ldu1 => Some(0x5),
            Self::Tsbk => Some(0x7),
            Self::Ldu2 => Some(0xA),
            Self::Pdu => Some(0xC),
            Self::Tdulc => Some(0xF),
            Self::Unknown => None,
        }
    }
}

/// Assembler state. Multi-block data units step through numbered states, one per
/// received block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameState {
    #[display("NID")]
    Nid,
    #[display("HDU")]
    Hdu,
    #[display("LDU1")]
    Ldu1,
    #[display("LDU2")]
    Ldu2,
    #[display("TDU")]
    Tdu,
    #[display("TDULC")]
    Tdulc,
    #[display("TSBK1")]
    Tsbk1,
    #[display("TSBK2")]
    Tsbk2,
    #[display("TSBK3")]
    Tsbk3,
    #[display("PDU0")]
    Pdu0,
    #[display("PDU1")]
    Pdu1,
    #[display("PDU2")]
    Pdu2,
    #[display("PDU3")]
    Pdu3,
    #[display("PDUC")]
    Pduc,
    #[display("UNKNOWN")]
    Unknown,
}

impl FrameState {
    /// State entered after a NID carrying `duid`, `None` for values with no defined
    /// data unit.
    pub fn from_duid(duid: u8) -> Option<Self> {
        match duid {
            0x0 => Some(Self::Hdu),
            0x3 => Some(Self::Tdu),
            0x5 => Some(Self::Ldu1),
            0x6 | 0x9 => Some(Self::Unknown),
            0x7 => Some(Self::Tsbk1),
            0xA => Some(Self::Ldu2),
            0xC => Some(Self::Pdu0),
            0xF => Some(Self::Tdulc),
            _ => None,
        }
    }
}

/// Frame length in bits for each assembler state, counted from the first NID bit with
/// status symbols removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameLengths {
    pub nid: usize,
    pub hdu: usize,
    pub tdu: usize,
    pub ldu1: usize,
    pub ldu2: usize,
    pub tdulc: usize,
    pub tsbk: usize,
    pub pdu0: usize,
    pub pdu1: usize,
    pub pdu2: usize,
    pub pdu3: usize,
    /// Initial length of a confirmed PDU, header plus the first block.
    pub pduc: usize,
    pub unknown: usize,
}

impl Default for FrameLengths {
    fn default() -> Self {
        Self {
            nid: 64,
            hdu: 712,
            tdu: 64,
            ldu1: 1632,
            ldu2: 1632,
            tdulc: 352,
            tsbk: 260,
            pdu0: 260,
            pdu1: 356,
            pdu2: 452,
            pdu3: 548,
            pduc: 356,
            unknown: 1632,
        }
    }
}

impl FrameLengths {
    pub fn length(&self, state: FrameState) -> usize {
        match state {
            FrameState::Nid => self.nid,
            FrameState::Hdu => self.hdu,
            FrameState::Tdu => self.tdu,
            FrameState::Ldu1 => self.ldu1,
            FrameState::Ldu2 => self.ldu2,
            FrameState::Tdulc => self.tdulc,
            FrameState::Tsbk1 | FrameState::Tsbk2 | FrameState::Tsbk3 => self.tsbk,
            FrameState::Pdu0 => self.pdu0,
            FrameState::Pdu1 => self.pdu1,
            FrameState::Pdu2 => self.pdu2,
            FrameState::Pdu3 => self.pdu3,
            FrameState::Pduc => self.pduc,
            FrameState::Unknown => self.unknown,
        }
    }

    /// Each length must be even, since bits arrive in pairs, and cover every field the
    /// state machine and message decoders touch.
    pub fn validate(&self) -> Result<()> {
        let minimums = [
            ("nid", self.nid, 64),
            ("hdu", self.hdu, 712),
            ("tdu", self.tdu, 64),
            ("ldu1", self.ldu1, 1312),
            ("ldu2", self.ldu2, 1312),
            ("tdulc", self.tdulc, 352),
            ("tsbk", self.tsbk, 260),
            ("pdu0", self.pdu0, 260),
            ("pdu1", self.pdu1, 356),
            ("pdu2", self.pdu2, 452),
            ("pdu3", self.pdu3, 548),
            ("pduc", self.pduc, 356),
            ("unknown", self.unknown, 64),
        ];
        for (name, length, minimum) in minimums {
            if length < minimum || length % 2 != 0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} frame length {length} must be even and at least {minimum}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for a [MessageFramer].
#[derive(Clone, Debug, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FramerConfig {
    #[builder(default = SYNC_PATTERN)]
    pub sync_pattern: u64,
    /// Significant low bits of `sync_pattern`.
    #[builder(default = SYNC_BITS)]
    pub sync_bits: usize,
    /// Number of mismatched bits still accepted as a sync.
    #[builder(default = 0)]
    pub sync_tolerance: u32,
    /// Baseband is inverted; dibits are remapped before framing.
    #[builder(default = false)]
    pub inverted: bool,
    #[builder(default)]
    pub lengths: FrameLengths,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FramerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sync_bits == 0 || self.sync_bits > 64 {
            return Err(Error::InvalidConfig(format!(
                "sync pattern must be 1 to 64 bits, got {}",
                self.sync_bits
            )));
        }
        if self.sync_bits < 64 && self.sync_pattern >> self.sync_bits != 0 {
            return Err(Error::InvalidConfig(format!(
                "sync pattern {:#x} does not fit in {} bits",
                self.sync_pattern, self.sync_bits
            )));
        }
        if self.sync_tolerance as usize >= self.sync_bits {
            return Err(Error::InvalidConfig(format!(
                "sync tolerance {} would match any {}-bit pattern",
                self.sync_tolerance, self.sync_bits
            )));
        }
        self.lengths.validate()
    }
}

impl fmt::Display for FramerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sync={:#x}/{} tolerance={} inverted={}",
            self.sync_pattern, self.sync_bits, self.sync_tolerance, self.inverted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn default_config_is_valid() {
        let config = FramerConfig::default();
        assert_eq!(config.sync_pattern, SYNC_PATTERN);
        assert_eq!(config.lengths.length(FrameState::Tsbk3), 260);
        config.validate().unwrap();
    }

    #[test_case(FramerConfig::builder().sync_bits(0).build() ; "empty pattern")]
    #[test_case(FramerConfig::builder().sync_bits(65).build() ; "pattern too long")]
    #[test_case(FramerConfig::builder().sync_bits(16).build() ; "pattern wider than bits")]
    #[test_case(FramerConfig::builder().sync_tolerance(48).build() ; "tolerance matches anything")]
    #[test_case(
        FramerConfig::builder().lengths(FrameLengths { tsbk: 196, ..Default::default() }).build()
        ; "short tsbk"
    )]
    #[test_case(
        FramerConfig::builder().lengths(FrameLengths { hdu: 713, ..Default::default() }).build()
        ; "odd length"
    )]
    fn invalid_config(config: FramerConfig) {
        let zult = config.validate();
        assert!(matches!(zult, Err(Error::InvalidConfig(_))), "got {zult:?}");
    }

    #[test]
    fn duid_states() {
        for duid in [DataUnitId::Hdu, DataUnitId::Tdu, DataUnitId::Ldu1, DataUnitId::Ldu2] {
            let state = FrameState::from_duid(duid.value().unwrap()).unwrap();
            assert_eq!(state.to_string(), duid.to_string());
        }
        assert_eq!(FrameState::from_duid(0x7), Some(FrameState::Tsbk1));
        assert_eq!(FrameState::from_duid(0xC), Some(FrameState::Pdu0));
        assert_eq!(FrameState::from_duid(0x6), Some(FrameState::Unknown));
        assert_eq!(FrameState::from_duid(0x9), Some(FrameState::Unknown));
        for duid in [0x1, 0x2, 0x4, 0x8, 0xB, 0xD, 0xE] {
            assert_eq!(FrameState::from_duid(duid), None, "duid {duid:#x}");
        }
    }
}
