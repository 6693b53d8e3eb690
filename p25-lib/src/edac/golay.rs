//! Extended Golay(24,12,8) and the Golay(18,6,8) code shortened from it.
//!
//! Words are held with the first transmitted bit most significant. Data bits lead, the
//! 11 cyclic parity bits follow, and an overall even parity bit closes the word.
use super::Integrity;

/// x^11 + x^10 + x^6 + x^5 + x^4 + x^2 + 1
const GENERATOR: u32 = 0xC75;
const PARITY_BITS: usize = 11;
const CYCLIC_BITS: usize = 23;
const WORD_BITS: usize = 24;
/// Leading data bits dropped by the shortened code.
const SHORTENED_BITS: usize = 6;
const SHORT_MASK: u32 = (1 << (WORD_BITS - SHORTENED_BITS)) - 1;

fn remainder(mut value: u32) -> u32 {
    for degree in (PARITY_BITS..CYCLIC_BITS).rev() {
        if value >> degree & 1 == 1 {
            value ^= GENERATOR << (degree - PARITY_BITS);
        }
    }
    value & ((1 << PARITY_BITS) - 1)
}

fn syndrome(word: u32) -> usize {
    (remainder(word >> 1) << 1 | word.count_ones() & 1) as usize
}

/// Encode 12 data bits into a 24-bit word.
pub fn encode_24(data: u16) -> u32 {
    let shifted = u32::from(data & 0xfff) << PARITY_BITS;
    let codeword = shifted | remainder(shifted);
    codeword << 1 | codeword.count_ones() & 1
}

/// Encode 6 data bits into an 18-bit word.
pub fn encode_18(data: u8) -> u32 {
    encode_24(u16::from(data & 0x3f)) & SHORT_MASK
}

/// Syndrome decoder correcting up to 3 bit errors per word.
#[derive(Clone, Debug)]
pub struct Golay {
    /// Error pattern for each syndrome, 0 where no pattern of weight 3 or less exists.
    errors: Vec<u32>,
}

impl Default for Golay {
    fn default() -> Self {
        Self::new()
    }
}

impl Golay {
    pub const T: usize = 3;

    pub fn new() -> Self {
        let mut errors = vec![0u32; 1 << (PARITY_BITS + 1)];
        for a in 0..WORD_BITS {
            let single = 1u32 << a;
            errors[syndrome(single)] = single;
            for b in a + 1..WORD_BITS {
                let double = single | 1 << b;
                errors[syndrome(double)] = double;
                for c in b + 1..WORD_BITS {
                    let triple = double | 1 << c;
                    errors[syndrome(triple)] = triple;
                }
            }
        }
        Self { errors }
    }

    /// Correct a 24-bit word. On failure the received word is returned unchanged.
    #[must_use]
    pub fn decode_24(&self, word: u32) -> (Integrity, u32) {
        let syndrome = syndrome(word);
        if syndrome == 0 {
            return (Integrity::Ok, word);
        }
        match self.errors[syndrome] {
            0 => (Integrity::Uncorrectable, word),
            error => (
                Integrity::Corrected(error.count_ones() as usize),
                word ^ error,
            ),
        }
    }

    /// Correct an 18-bit shortened word. A correction that lands in the shortened,
    /// always zero, bits makes the word uncorrectable.
    #[must_use]
    pub fn decode_18(&self, word: u32) -> (Integrity, u32) {
        let word = word & SHORT_MASK;
        match self.decode_24(word) {
            (Integrity::Corrected(_), corrected) if corrected & !SHORT_MASK != 0 => {
                (Integrity::Uncorrectable, word)
            }
            zult => zult,
        }
    }

    /// Data bits of a corrected 24-bit word.
    pub fn data_24(word: u32) -> u16 {
        (word >> (PARITY_BITS + 1)) as u16 & 0xfff
    }

    /// Data bits of a corrected 18-bit word.
    pub fn data_18(word: u32) -> u8 {
        (word >> (PARITY_BITS + 1)) as u8 & 0x3f
    }
}
