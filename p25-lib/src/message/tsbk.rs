use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::DataUnit;
use crate::{bits::BinaryMessage, edac::CCITT_80, framing::DataUnitId};

const START: usize = 64;

/// Trunking signalling block, one 96-bit block after trellis decoding and CRC check.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Tsbk {
    pub unit: DataUnit,
    /// Last block of a TSBK sequence.
    pub last_block: bool,
    pub protected: bool,
    pub opcode: u8,
    pub mfid: u8,
    pub arguments: [u8; 8],
}

impl Tsbk {
    /// Read the fields of a decoded block located at bit 64 of `bits`.
    pub fn parse(nac: u16, bits: BinaryMessage) -> Self {
        let mut arguments = [0u8; 8];
        arguments.copy_from_slice(&bits.bytes_in(START + 16, START + 80));
        Self {
            last_block: bits.get(START),
            protected: bits.get(START + 1),
            opcode: bits.get_range(START + 2, START + 8) as u8,
            mfid: bits.get_range(START + 8, START + 16) as u8,
            arguments,
            unit: DataUnit::new(nac, DataUnitId::Tsbk, true, bits),
        }
    }

    /// Build the 96-bit block for the given fields, CRC included.
    pub fn encode_block(
        last_block: bool,
        opcode: u8,
        mfid: u8,
        arguments: &[u8; 8],
    ) -> BinaryMessage {
        let mut block = BinaryMessage::new(96);
        block.set(0, last_block);
        block.load(2, 6, u64::from(opcode));
        block.load(8, 8, u64::from(mfid));
        for (i, b) in arguments.iter().enumerate() {
            block.load(16 + i * 8, 8, u64::from(*b));
        }
        let crc = CCITT_80.checksum(&block.bytes_in(0, 80));
        block.load(80, 16, u64::from(crc));
        block
    }

    /// Name of standard outbound opcodes.
    pub fn opcode_name(&self) -> Option<&'static str> {
        if self.mfid > 1 {
            return None;
        }
        let name = match self.opcode {
            0x00 => "GROUP VOICE GRANT",
            0x02 => "GROUP VOICE GRANT UPDATE",
            0x04 => "UNIT TO UNIT GRANT",
            0x08 => "TELEPHONE GRANT",
            0x28 => "GROUP AFFILIATION RESPONSE",
            0x2C => "UNIT REGISTRATION RESPONSE",
            0x34 => "IDENTIFIER UPDATE VUHF",
            0x39 => "SECONDARY CONTROL BROADCAST",
            0x3A => "RFSS STATUS BROADCAST",
            0x3B => "NETWORK STATUS BROADCAST",
            0x3C => "ADJACENT STATUS BROADCAST",
            0x3D => "IDENTIFIER UPDATE",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Tsbk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode_name() {
            Some(name) => f.write_str(name)?,
            None => write!(f, "OPCODE:{:02X} MFID:{:02X}", self.opcode, self.mfid)?,
        }
        f.write_str(" ARGS:")?;
        for b in self.arguments {
            write!(f, "{b:02X}")?;
        }
        if self.last_block {
            f.write_str(" LAST")?;
        }
        Ok(())
    }
}
