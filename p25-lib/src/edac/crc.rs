//! Cyclic redundancy checks used by trunking and data blocks.
use crc::{Crc, CRC_16_GSM, CRC_32_CKSUM};
use tracing::trace;

use super::Integrity;
use crate::bits::BinaryMessage;

/// CRC-CCITT as used over the 80 data bits of a TSBK or PDU header.
pub const CCITT_80: Crc<u16> = Crc::<u16>::new(&CRC_16_GSM);
/// 32-bit packet CRC closing a confirmed data packet.
pub const PACKET_CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_CKSUM);

const CCITT_DATA_BITS: usize = 80;
const CCITT_BLOCK_BITS: usize = 96;

/// x^9 + x^6 + x^4 + x^3 + 1
const CRC9_POLY: u32 = 0x059;
const CRC9_XOROUT: u32 = 0x1ff;

/// `true` when the CRC-CCITT in bits `start+80..start+96` matches bits `start..start+80`.
pub fn check_ccitt80(msg: &BinaryMessage, start: usize) -> bool {
    let data = msg.bytes_in(start, start + CCITT_DATA_BITS);
    let expected = msg.get_range(start + CCITT_DATA_BITS, start + CCITT_BLOCK_BITS) as u16;
    CCITT_80.checksum(&data) == expected
}

/// Check a 96-bit CRC-CCITT block and repair a single bit error in place.
///
/// Returns [Integrity::Ok], [Integrity::Corrected] when exactly one flipped bit makes the
/// block check, or [Integrity::Failed] with the block left as received.
pub fn correct_ccitt80(msg: &mut BinaryMessage, start: usize) -> Integrity {
    if check_ccitt80(msg, start) {
        return Integrity::Ok;
    }
    for idx in start..start + CCITT_BLOCK_BITS {
        msg.flip(idx);
        if check_ccitt80(msg, start) {
            trace!(bit = idx - start, "corrected crc block");
            return Integrity::Corrected(1);
        }
        msg.flip(idx);
    }
    Integrity::Failed
}

fn crc_bits<I: Iterator<Item = bool>>(bits: I, poly: u32, width: u32) -> u32 {
    let top = 1u32 << (width - 1);
    let mask = (1u32 << width) - 1;
    bits.fold(0u32, |reg, bit| {
        let feedback = (reg & top != 0) ^ bit;
        let reg = (reg << 1) & mask;
        if feedback {
            reg ^ poly
        } else {
            reg
        }
    })
}

/// CRC-9 of a confirmed data block starting at `start`: computed over the 7-bit serial
/// number followed by the 128 data bits, skipping the CRC field itself.
pub fn crc9(msg: &BinaryMessage, start: usize) -> u16 {
    let bits = (start..start + 7)
        .chain(start + 16..start + 144)
        .map(|idx| msg.get(idx));
    (crc_bits(bits, CRC9_POLY, 9) ^ CRC9_XOROUT) as u16
}

/// `true` when the CRC-9 carried in bits `start+7..start+16` is correct.
pub fn check_crc9(msg: &BinaryMessage, start: usize) -> bool {
    msg.get_range(start + 7, start + 16) as u16 == crc9(msg, start)
}

pub fn packet_crc32(dat: &[u8]) -> u32 {
    PACKET_CRC32.checksum(dat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(data: u128) -> BinaryMessage {
        let mut msg = BinaryMessage::new(CCITT_BLOCK_BITS);
        msg.load(0, 64, (data >> 16) as u64);
        msg.load(64, 16, (data & 0xffff) as u64);
        let crc = CCITT_80.checksum(&msg.bytes_in(0, CCITT_DATA_BITS));
        msg.load(80, 16, u64::from(crc));
        msg
    }

    #[test]
    fn gsm_parameters() {
        // poly 0x1021, init 0, complemented output
        assert_eq!(CCITT_80.checksum(b"123456789"), 0xce3c);
    }

    #[test]
    fn check_passes_clean_block() {
        let mut msg = block(0x00_1234_5678_9abc_def0_1122);
        assert!(check_ccitt80(&msg, 0));
        assert_eq!(correct_ccitt80(&mut msg, 0), Integrity::Ok);
    }

    #[test]
    fn corrects_any_single_bit() {
        let original = block(0x00_8000_0000_0000_0000_4321);
        for idx in 0..CCITT_BLOCK_BITS {
            let mut msg = original.clone();
            msg.flip(idx);
            assert_eq!(correct_ccitt80(&mut msg, 0), Integrity::Corrected(1), "bit {idx}");
            assert_eq!(msg, original, "bit {idx}");
        }
    }

    #[test]
    fn double_error_fails_unmodified() {
        let mut msg = block(0x00_0fed_cba9_8765_4321_0f0f);
        msg.flip(3);
        msg.flip(77);
        let received = msg.clone();
        assert_eq!(correct_ccitt80(&mut msg, 0), Integrity::Failed);
        assert_eq!(msg, received);
    }

    #[test]
    fn crc9_detects_errors() {
        let mut msg = BinaryMessage::new(144);
        msg.load(0, 7, 0x2a);
        msg.load(16, 64, 0xdead_beef_0102_0304);
        msg.load(80, 64, 0x0a0b_0c0d_0e0f_1011);
        let crc = crc9(&msg, 0);
        assert!(crc < 0x200);
        msg.load(7, 9, u64::from(crc));
        assert!(check_crc9(&msg, 0));
        msg.flip(100);
        assert!(!check_crc9(&msg, 0));
    }

    #[test]
    fn packet_crc_parameters() {
        assert_eq!(packet_crc32(b"123456789"), 0x765e_7680);
    }
}
