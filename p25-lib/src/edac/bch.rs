//! BCH(63,16,23) protecting the P25 network identifier.
use super::{BerlekampMassey, Integrity};
use crate::bits::BinaryMessage;

/// Generator polynomial, bit `i` is the coefficient of `x^i`.
const GENERATOR: u64 = 0o6331141367235453;
const N: usize = 63;
const K: usize = 16;
const PARITY_BITS: usize = N - K;

/// Systematic BCH(63,16) codec correcting up to 11 bit errors.
///
/// Transmitted bit `k` of the codeword is the coefficient of `x^(62-k)`, so the 16 data
/// bits lead and the 47 parity bits follow. The 64th bit of a NID is an overall parity
/// bit that the decoder does not use.
#[derive(Clone, Debug)]
pub struct Bch63_16 {
    decoder: BerlekampMassey,
}

impl Default for Bch63_16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Bch63_16 {
    pub const T: usize = 11;

    pub fn new() -> Self {
        Self {
            decoder: BerlekampMassey::new(Self::T),
        }
    }

    /// Compute the 63-bit codeword for 16 data bits, first transmitted bit in bit 62.
    pub fn encode(&self, data: u16) -> u64 {
        let shifted = u64::from(data) << PARITY_BITS;
        let mut remainder = shifted;
        for degree in (PARITY_BITS..N).rev() {
            if remainder >> degree & 1 == 1 {
                remainder ^= GENERATOR << (degree - PARITY_BITS);
            }
        }
        shifted | remainder
    }

    /// Encode a full 64 bit NID for `nac` and `duid`, with even overall parity.
    pub fn encode_nid(&self, nac: u16, duid: u8) -> u64 {
        let codeword = self.encode((nac & 0xfff) << 4 | u16::from(duid & 0xf));
        let parity = u64::from(codeword.count_ones() & 1);
        codeword << 1 | parity
    }

    /// Correct a 63-bit codeword, first transmitted bit in bit 62.
    ///
    /// On failure the received word is returned unchanged.
    #[must_use]
    pub fn decode_word(&self, codeword: u64) -> (Integrity, u64) {
        let mut word: Vec<u8> = (0..N).map(|i| (codeword >> i & 1) as u8).collect();
        let integrity = self.decoder.decode_binary(&mut word);
        let corrected = word
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | u64::from(*b) << i);
        (integrity, corrected)
    }

    /// Correct the codeword in bits `0..63` of `msg` in place.
    pub fn decode(&self, msg: &mut BinaryMessage) -> Integrity {
        let (integrity, corrected) = self.decode_word(msg.get_range(0, N));
        if let Integrity::Corrected(_) = integrity {
            msg.load(0, N, corrected);
        }
        integrity
    }
}
