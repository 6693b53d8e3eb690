//! Link control and encryption sync carried by LDU1, LDU2 and TDULC frames.
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::{hexbit_message, DataUnit};
use crate::{
    bits::BinaryMessage,
    edac::{data_10, decode_10, encode_10, encode_24, Golay, HexbitCode},
    framing::DataUnitId,
};

/// Starts of the six 40-bit segments that carry LC or ES hexbits between voice frames.
pub const LDU_SEGMENTS: [usize; 6] = [352, 536, 720, 904, 1088, 1272];
/// Hamming(10,6,3) words, data bits leading, each corrected before RS decoding.
const HAMMING_WORD_BITS: usize = 10;
const WORDS_PER_SEGMENT: usize = 4;

const TDULC_START: usize = 64;
/// Golay(24,12,8) words, data bits leading.
const GOLAY_WORD_BITS: usize = 24;
const TDULC_WORDS: usize = 12;

const LCO_GROUP_VOICE: u8 = 0x00;
const LCO_UNIT_TO_UNIT: u8 = 0x03;
const LCO_TELEPHONE: u8 = 0x06;

fn ldu_hexbits(bits: &BinaryMessage) -> Vec<u8> {
    LDU_SEGMENTS
        .iter()
        .flat_map(|seg| {
            (0..WORDS_PER_SEGMENT).map(move |w| {
                let start = seg + w * HAMMING_WORD_BITS;
                let word = bits.get_range(start, start + HAMMING_WORD_BITS) as u16;
                let (_, corrected) = decode_10(word);
                data_10(corrected)
            })
        })
        .collect()
}

fn load_ldu_hexbits(bits: &mut BinaryMessage, hexbits: &[u8]) {
    let positions = LDU_SEGMENTS.iter().flat_map(|seg| {
        (0..WORDS_PER_SEGMENT).map(move |w| seg + w * HAMMING_WORD_BITS)
    });
    for (start, h) in positions.zip(hexbits) {
        bits.load(start, HAMMING_WORD_BITS, u64::from(encode_10(*h)));
    }
}

fn tdulc_hexbits(bits: &BinaryMessage, golay: &Golay) -> Vec<u8> {
    (0..TDULC_WORDS)
        .flat_map(|w| {
            let start = TDULC_START + w * GOLAY_WORD_BITS;
            let word = bits.get_range(start, start + GOLAY_WORD_BITS) as u32;
            let (_, corrected) = golay.decode_24(word);
            let data = Golay::data_24(corrected);
            [(data >> 6) as u8, (data & 0x3f) as u8]
        })
        .collect()
}

/// Split `fields` into `k` hexbits and RS encode them.
fn encode_fields(fields: &BinaryMessage, rs: &HexbitCode) -> Vec<u8> {
    let data: Vec<u8> = (0..rs.k())
        .map(|i| fields.get_range(i * 6, i * 6 + 6) as u8)
        .collect();
    rs.encode(&data)
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum LinkControlKind {
    GroupVoice {
        service_options: u8,
        talkgroup: u16,
        source: u32,
    },
    UnitToUnit {
        service_options: u8,
        target: u32,
        source: u32,
    },
    Telephone {
        service_options: u8,
        call_timer: u16,
        address: u32,
    },
    /// Any other format, or a manufacturer specific word.
    Other,
}

/// A 72-bit link control word.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LinkControl {
    /// Word is encrypted.
    pub protected: bool,
    /// Standard format flag; when set the MFID is implied.
    pub implicit_mfid: bool,
    /// Link control opcode (LCO), 6 bits.
    pub opcode: u8,
    pub mfid: u8,
    pub kind: LinkControlKind,
    pub raw: [u8; 9],
}

impl LinkControl {
    /// Parse the first 72 bits of `word`.
    pub fn parse(word: &BinaryMessage) -> Self {
        let protected = word.get(0);
        let opcode = word.get_range(2, 8) as u8;
        let mfid = word.get_range(8, 16) as u8;
        let service_options = word.get_range(16, 24) as u8;

        let kind = if protected || mfid > 1 {
            LinkControlKind::Other
        } else {
            match opcode {
                LCO_GROUP_VOICE => LinkControlKind::GroupVoice {
                    service_options,
                    talkgroup: word.get_range(32, 48) as u16,
                    source: word.get_range(48, 72) as u32,
                },
                LCO_UNIT_TO_UNIT => LinkControlKind::UnitToUnit {
                    service_options,
                    target: word.get_range(24, 48) as u32,
                    source: word.get_range(48, 72) as u32,
                },
                LCO_TELEPHONE => LinkControlKind::Telephone {
                    service_options,
                    call_timer: word.get_range(32, 48) as u16,
                    address: word.get_range(48, 72) as u32,
                },
                _ => LinkControlKind::Other,
            }
        };

        let mut raw = [0u8; 9];
        raw.copy_from_slice(&word.bytes_in(0, 72));
        Self {
            protected,
            implicit_mfid: word.get(1),
            opcode,
            mfid,
            kind,
            raw,
        }
    }

    fn decode_hexbits(mut hexbits: Vec<u8>, rs: &HexbitCode) -> (Self, bool) {
        let integrity = rs.decode(&mut hexbits);
        let word = hexbit_message(&hexbits[..rs.k()]);
        (Self::parse(&word), integrity.ok())
    }

    /// The LC word as a 72-bit message.
    pub fn to_message(&self) -> BinaryMessage {
        BinaryMessage::from_bytes(&self.raw, 72)
    }
}

impl fmt::Display for LinkControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LinkControlKind::GroupVoice {
                talkgroup, source, ..
            } => write!(f, "GROUP VOICE TG:{talkgroup} FROM:{source}"),
            LinkControlKind::UnitToUnit { target, source, .. } => {
                write!(f, "UNIT TO UNIT TO:{target} FROM:{source}")
            }
            LinkControlKind::Telephone {
                call_timer,
                address,
                ..
            } => write!(f, "TELEPHONE ADDR:{address} TIMER:{call_timer}"),
            LinkControlKind::Other => {
                write!(f, "LCO:{:02X} MFID:{:02X}", self.opcode, self.mfid)?;
                if self.protected {
                    f.write_str(" ENCRYPTED")?;
                }
                Ok(())
            }
        }
    }
}

/// Encryption sync carried by LDU2.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EncryptionSync {
    pub message_indicator: [u8; 9],
    pub algorithm_id: u8,
    pub key_id: u16,
}

impl EncryptionSync {
    fn parse(fields: &BinaryMessage) -> Self {
        let mut message_indicator = [0u8; 9];
        message_indicator.copy_from_slice(&fields.bytes_in(0, 72));
        Self {
            message_indicator,
            algorithm_id: fields.get_range(72, 80) as u8,
            key_id: fields.get_range(80, 96) as u16,
        }
    }

    fn to_message(&self) -> BinaryMessage {
        let mut fields = BinaryMessage::new(96);
        for (i, b) in self.message_indicator.iter().enumerate() {
            fields.load(i * 8, 8, u64::from(*b));
        }
        fields.load(72, 8, u64::from(self.algorithm_id));
        fields.load(80, 16, u64::from(self.key_id));
        fields
    }
}

impl fmt::Display for EncryptionSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALGID:{:02X} KID:{:04X} MI:", self.algorithm_id, self.key_id)?;
        for b in self.message_indicator {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Voice frame carrying link control.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LogicalLinkDataUnit1 {
    pub unit: DataUnit,
    pub link_control: LinkControl,
}

impl LogicalLinkDataUnit1 {
    pub fn decode(nac: u16, bits: BinaryMessage, rs: &HexbitCode) -> Self {
        let (link_control, valid) = LinkControl::decode_hexbits(ldu_hexbits(&bits), rs);
        Self {
            unit: DataUnit::new(nac, DataUnitId::Ldu1, valid, bits),
            link_control,
        }
    }

    /// Write `lc` into the LC segments of an LDU1 frame.
    pub fn encode(lc: &LinkControl, bits: &mut BinaryMessage, rs: &HexbitCode) {
        load_ldu_hexbits(bits, &encode_fields(&lc.to_message(), rs));
    }
}

/// Voice frame carrying encryption sync.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LogicalLinkDataUnit2 {
    pub unit: DataUnit,
    pub encryption: EncryptionSync,
}

impl LogicalLinkDataUnit2 {
    pub fn decode(nac: u16, bits: BinaryMessage, rs: &HexbitCode) -> Self {
        let mut hexbits = ldu_hexbits(&bits);
        let valid = rs.decode(&mut hexbits).ok();
        let encryption = EncryptionSync::parse(&hexbit_message(&hexbits[..rs.k()]));
        Self {
            unit: DataUnit::new(nac, DataUnitId::Ldu2, valid, bits),
            encryption,
        }
    }

    pub fn encode(es: &EncryptionSync, bits: &mut BinaryMessage, rs: &HexbitCode) {
        load_ldu_hexbits(bits, &encode_fields(&es.to_message(), rs));
    }
}

/// Terminator carrying link control.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TerminatorLinkControl {
    pub unit: DataUnit,
    pub link_control: LinkControl,
}

impl TerminatorLinkControl {
    pub fn decode(nac: u16, bits: BinaryMessage, golay: &Golay, rs: &HexbitCode) -> Self {
        let (link_control, valid) =
            LinkControl::decode_hexbits(tdulc_hexbits(&bits, golay), rs);
        Self {
            unit: DataUnit::new(nac, DataUnitId::Tdulc, valid, bits),
            link_control,
        }
    }

    /// Write `lc` into the Golay words of a TDULC frame.
    pub fn encode(lc: &LinkControl, bits: &mut BinaryMessage, rs: &HexbitCode) {
        let hexbits = encode_fields(&lc.to_message(), rs);
        for (w, pair) in hexbits.chunks(2).enumerate() {
            let data = u16::from(pair[0]) << 6 | u16::from(pair[1]);
            let start = TDULC_START + w * GOLAY_WORD_BITS;
            bits.load(start, GOLAY_WORD_BITS, u64::from(encode_24(data)));
        }
    }
}
