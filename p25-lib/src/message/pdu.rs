//! Packet data units: a header block followed by unconfirmed (rate 1/2) or confirmed
//! (rate 3/4) data blocks.
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::DataUnit;
use crate::{
    bits::BinaryMessage,
    edac::{check_ccitt80, check_crc9, crc9, packet_crc32, CCITT_80},
    framing::DataUnitId,
};

const HEADER_START: usize = 64;
/// First data block, right after the decoded header.
pub const BLOCKS_START: usize = 160;
pub const UNCONFIRMED_BLOCK_BITS: usize = 96;
pub const CONFIRMED_BLOCK_BITS: usize = 144;
const CONFIRMED_DATA_OCTETS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PduFormat {
    #[display("RESPONSE")]
    Response,
    #[display("UNCONFIRMED MBT")]
    UnconfirmedMultiBlockTrunking,
    #[display("PACKET DATA")]
    PacketData,
    #[display("ALTERNATE MBT")]
    AlternateMultiBlockTrunking,
    #[display("FORMAT {_0:02X}")]
    Other(u8),
}

impl PduFormat {
    pub fn from_value(value: u8) -> Self {
        match value & 0x1f {
            0b00011 => Self::Response,
            0b10101 => Self::UnconfirmedMultiBlockTrunking,
            0b10110 => Self::PacketData,
            0b10111 => Self::AlternateMultiBlockTrunking,
            other => Self::Other(other),
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::Response => 0b00011,
            Self::UnconfirmedMultiBlockTrunking => 0b10101,
            Self::PacketData => 0b10110,
            Self::AlternateMultiBlockTrunking => 0b10111,
            Self::Other(value) => value & 0x1f,
        }
    }
}

/// Header block of a packet data unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PduHeader {
    /// Delivery must be acknowledged; data blocks use the rate 3/4 confirmed layout.
    pub confirmed: bool,
    /// Direction flag, set for outbound (from the fixed network).
    pub outbound: bool,
    pub format: PduFormat,
    /// Service access point.
    pub sap: u8,
    pub mfid: u8,
    /// Logical link id, 24 bits.
    pub llid: u32,
    pub full_message: bool,
    pub blocks_to_follow: u8,
    pub pad_octets: u8,
    /// Synchronize flag and send sequence number for confirmed data, or the opcode of
    /// trunking blocks.
    pub sequence: u8,
    pub data_header_offset: u8,
}

impl PduHeader {
    /// Read the header fields at bit 64 of `bits`.
    pub fn parse(bits: &BinaryMessage) -> Self {
        let at = |start: usize, end: usize| {
            bits.get_range(HEADER_START + start, HEADER_START + end)
        };
        Self {
            confirmed: bits.get(HEADER_START + 1),
            outbound: bits.get(HEADER_START + 2),
            format: PduFormat::from_value(at(3, 8) as u8),
            sap: at(10, 16) as u8,
            mfid: at(16, 24) as u8,
            llid: at(24, 48) as u32,
            full_message: bits.get(HEADER_START + 48),
            blocks_to_follow: at(49, 56) as u8,
            pad_octets: at(59, 64) as u8,
            sequence: at(64, 72) as u8,
            data_header_offset: at(74, 80) as u8,
        }
    }

    /// Build the 96-bit header block, CRC included.
    pub fn encode_block(&self) -> BinaryMessage {
        let mut block = BinaryMessage::new(96);
        block.set(1, self.confirmed);
        block.set(2, self.outbound);
        block.load(3, 5, u64::from(self.format.value()));
        block.load(10, 6, u64::from(self.sap));
        block.load(16, 8, u64::from(self.mfid));
        block.load(24, 24, u64::from(self.llid));
        block.set(48, self.full_message);
        block.load(49, 7, u64::from(self.blocks_to_follow));
        block.load(59, 5, u64::from(self.pad_octets));
        block.load(64, 8, u64::from(self.sequence));
        block.load(74, 6, u64::from(self.data_header_offset));
        let crc = CCITT_80.checksum(&block.bytes_in(0, 80));
        block.load(80, 16, u64::from(crc));
        block
    }
}

/// One block of a confirmed packet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConfirmedBlock {
    /// Data block serial number, 7 bits.
    pub serial: u8,
    pub crc_ok: bool,
    pub data: [u8; CONFIRMED_DATA_OCTETS],
}

impl ConfirmedBlock {
    fn parse(bits: &BinaryMessage, start: usize) -> Self {
        let mut data = [0u8; CONFIRMED_DATA_OCTETS];
        data.copy_from_slice(&bits.bytes_in(start + 16, start + CONFIRMED_BLOCK_BITS));
        Self {
            serial: bits.get_range(start, start + 7) as u8,
            crc_ok: check_crc9(bits, start),
            data,
        }
    }

    /// Build the 144-bit block for `serial` and `data`, CRC-9 included.
    pub fn encode_block(serial: u8, data: &[u8; CONFIRMED_DATA_OCTETS]) -> BinaryMessage {
        let mut block = BinaryMessage::new(CONFIRMED_BLOCK_BITS);
        block.load(0, 7, u64::from(serial));
        for (i, b) in data.iter().enumerate() {
            block.load(16 + i * 8, 8, u64::from(*b));
        }
        let crc = crc9(&block, 0);
        block.load(7, 9, u64::from(crc));
        block
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PacketDataUnit {
    pub unit: DataUnit,
    pub header: PduHeader,
    /// 12-octet payloads of unconfirmed blocks.
    pub blocks: Vec<Vec<u8>>,
    pub confirmed_blocks: Vec<ConfirmedBlock>,
    /// Outcome of the packet CRC-32 closing a confirmed packet, `None` unless every
    /// announced block was received.
    pub packet_crc_ok: Option<bool>,
}

impl PacketDataUnit {
    /// Read a decoded PDU. The header occupies bits 64..160 and the data blocks follow
    /// back to back at 160 to the end of `bits`.
    ///
    /// `decoded` reports whether every trellis decode succeeded; the header CRC is
    /// checked here and both feed [DataUnit::valid].
    pub fn decode(nac: u16, bits: BinaryMessage, decoded: bool) -> Self {
        let header = PduHeader::parse(&bits);
        let header_ok = check_ccitt80(&bits, HEADER_START);
        let announced = usize::from(header.blocks_to_follow);
        let available = bits.size().saturating_sub(BLOCKS_START);

        let mut blocks = Vec::new();
        let mut confirmed_blocks = Vec::new();
        let mut packet_crc_ok = None;
        if header.confirmed {
            let count = (available / CONFIRMED_BLOCK_BITS).min(announced);
            confirmed_blocks = (0..count)
                .map(|i| {
                    ConfirmedBlock::parse(&bits, BLOCKS_START + i * CONFIRMED_BLOCK_BITS)
                })
                .collect();
            if count == announced && count > 0 {
                let payload: Vec<u8> = confirmed_blocks.iter().flat_map(|b| b.data).collect();
                let (body, trailer) = payload.split_at(payload.len() - 4);
                let expected =
                    u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
                packet_crc_ok = Some(packet_crc32(body) == expected);
            }
        } else {
            let count = (available / UNCONFIRMED_BLOCK_BITS).min(announced);
            blocks = (0..count)
                .map(|i| {
                    let start = BLOCKS_START + i * UNCONFIRMED_BLOCK_BITS;
                    bits.bytes_in(start, start + UNCONFIRMED_BLOCK_BITS)
                })
                .collect();
        }

        Self {
            unit: DataUnit::new(nac, DataUnitId::Pdu, decoded && header_ok, bits),
            header,
            blocks,
            confirmed_blocks,
            packet_crc_ok,
        }
    }

    /// Number of data blocks received.
    pub fn block_count(&self) -> usize {
        self.blocks.len() + self.confirmed_blocks.len()
    }

    /// Concatenated block payloads, pad and packet CRC included.
    pub fn payload(&self) -> Vec<u8> {
        if self.header.confirmed {
            self.confirmed_blocks.iter().flat_map(|b| b.data).collect()
        } else {
            self.blocks.concat()
        }
    }
}

impl fmt::Display for PacketDataUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        write!(
            f,
            "{} LLID:{} SAP:{} BLOCKS:{}/{}",
            h.format,
            h.llid,
            h.sap,
            self.block_count(),
            h.blocks_to_follow
        )?;
        if h.confirmed {
            f.write_str(" CONFIRMED")?;
        }
        if self.packet_crc_ok == Some(false) {
            f.write_str(" [PACKET CRC FAIL]")?;
        }
        Ok(())
    }
}
