//! Shortened Hamming(10,6,3) protecting LDU link control and encryption sync hexbits.
use super::Integrity;

/// Parity contribution of each data bit, first transmitted bit first.
const COLUMNS: [u16; 6] = [0b1110, 0b1101, 0b1011, 0b0111, 0b0011, 0b1100];
const PARITY_BITS: usize = 4;

fn parity(data: u8) -> u16 {
    COLUMNS
        .iter()
        .enumerate()
        .filter(|(i, _)| data >> (5 - i) & 1 == 1)
        .fold(0, |acc, (_, c)| acc ^ c)
}

/// Encode 6 data bits into a 10-bit word, data bits leading.
pub fn encode_10(data: u8) -> u16 {
    u16::from(data & 0x3f) << PARITY_BITS | parity(data & 0x3f)
}

/// Data bits of a 10-bit word.
pub fn data_10(word: u16) -> u8 {
    (word >> PARITY_BITS) as u8 & 0x3f
}

/// Correct a single bit error in a 10-bit word. On failure the received word is
/// returned unchanged.
#[must_use]
pub fn decode_10(word: u16) -> (Integrity, u16) {
    let syndrome = parity(data_10(word)) ^ word & 0xf;
    if syndrome == 0 {
        return (Integrity::Ok, word);
    }
    if syndrome.count_ones() == 1 {
        return (Integrity::Corrected(1), word ^ syndrome);
    }
    match COLUMNS.iter().position(|c| *c == syndrome) {
        Some(bit) => (Integrity::Corrected(1), word ^ 1 << (9 - bit)),
        None => (Integrity::Uncorrectable, word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codeword() {
        assert_eq!(encode_10(0b10_1101), 0x2de);
        assert_eq!(data_10(0x2de), 0b10_1101);
    }

    #[test]
    fn corrects_every_single_error() {
        for data in 0..64u8 {
            let word = encode_10(data);
            assert_eq!(decode_10(word), (Integrity::Ok, word));
            for bit in 0..10 {
                let (integrity, corrected) = decode_10(word ^ 1 << bit);
                assert_eq!(integrity, Integrity::Corrected(1), "data {data} bit {bit}");
                assert_eq!(corrected, word, "data {data} bit {bit}");
            }
        }
    }

    #[test]
    fn unmatched_syndrome_is_uncorrectable() {
        // last two data bits: columns 0b0011 ^ 0b1100
        let word = encode_10(0b01_0110) ^ 0b00_0011_0000;
        assert_eq!(decode_10(word), (Integrity::Uncorrectable, word));
    }
}
