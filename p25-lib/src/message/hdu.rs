use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::{hexbit_message, DataUnit};
use crate::{
    bits::BinaryMessage,
    edac::{encode_18, Golay, HexbitCode},
    framing::DataUnitId,
};

const GOLAY_START: usize = 64;
/// Golay(18,6,8) words, 6 data bits leading.
const GOLAY_WORD_BITS: usize = 18;
const HEXBITS: usize = 36;

/// Header data unit opening a voice call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HeaderDataUnit {
    pub unit: DataUnit,
    /// 72-bit encryption message indicator.
    pub message_indicator: [u8; 9],
    pub mfid: u8,
    pub algorithm_id: u8,
    pub key_id: u16,
    pub talkgroup: u16,
}

impl HeaderDataUnit {
    /// Read the header from an assembled HDU frame. Each Golay word is corrected before
    /// the RS(36,20,17) hexbits are.
    pub fn decode(nac: u16, bits: BinaryMessage, golay: &Golay, rs: &HexbitCode) -> Self {
        let mut hexbits: Vec<u8> = (0..HEXBITS)
            .map(|i| {
                let start = GOLAY_START + i * GOLAY_WORD_BITS;
                let word = bits.get_range(start, start + GOLAY_WORD_BITS) as u32;
                let (_, corrected) = golay.decode_18(word);
                Golay::data_18(corrected)
            })
            .collect();
        let integrity = rs.decode(&mut hexbits);
        let fields = hexbit_message(&hexbits[..rs.k()]);

        let mut message_indicator = [0u8; 9];
        message_indicator.copy_from_slice(&fields.bytes_in(0, 72));
        Self {
            message_indicator,
            mfid: fields.get_range(72, 80) as u8,
            algorithm_id: fields.get_range(80, 88) as u8,
            key_id: fields.get_range(88, 104) as u16,
            talkgroup: fields.get_range(104, 120) as u16,
            unit: DataUnit::new(nac, DataUnitId::Hdu, integrity.ok(), bits),
        }
    }

    /// Write the header fields into an HDU frame, the inverse of [Self::decode].
    pub fn encode(&self, bits: &mut BinaryMessage, rs: &HexbitCode) {
        let mut fields = BinaryMessage::new(120);
        for (i, b) in self.message_indicator.iter().enumerate() {
            fields.load(i * 8, 8, u64::from(*b));
        }
        fields.load(72, 8, u64::from(self.mfid));
        fields.load(80, 8, u64::from(self.algorithm_id));
        fields.load(88, 16, u64::from(self.key_id));
        fields.load(104, 16, u64::from(self.talkgroup));
        let data: Vec<u8> = (0..rs.k())
            .map(|i| fields.get_range(i * 6, i * 6 + 6) as u8)
            .collect();
        for (i, h) in rs.encode(&data).into_iter().enumerate() {
            let word = encode_18(h);
            bits.load(GOLAY_START + i * GOLAY_WORD_BITS, GOLAY_WORD_BITS, u64::from(word));
        }
    }

    /// Algorithm 0x80 means unencrypted.
    pub fn is_encrypted(&self) -> bool {
        self.algorithm_id != 0x80
    }
}

impl fmt::Display for HeaderDataUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TG:{} MFID:{:02X} ALGID:{:02X} KID:{:04X} MI:",
            self.talkgroup, self.mfid, self.algorithm_id, self.key_id
        )?;
        for b in self.message_indicator {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}
