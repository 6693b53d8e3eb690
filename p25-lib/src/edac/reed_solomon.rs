//! Shortened Reed-Solomon codes over 6-bit symbols (hexbits).
use super::{BerlekampMassey, Integrity};

/// A shortened RS(n,k) code with data hexbits first and parity hexbits last, as the
/// hexbits are transmitted.
#[derive(Clone, Debug)]
pub struct HexbitCode {
    n: usize,
    k: usize,
    decoder: BerlekampMassey,
}

impl HexbitCode {
    /// # Panics
    /// If `n - k` is not a positive even number or `n` exceeds 63.
    pub fn new(n: usize, k: usize) -> Self {
        assert!(n <= 63 && k < n && (n - k) % 2 == 0, "invalid RS({n},{k})");
        Self {
            n,
            k,
            decoder: BerlekampMassey::new((n - k) / 2),
        }
    }

    /// RS(24,12,13) protecting link control words.
    pub fn rs_24_12_13() -> Self {
        Self::new(24, 12)
    }

    /// RS(24,16,9) protecting encryption sync words.
    pub fn rs_24_16_9() -> Self {
        Self::new(24, 16)
    }

    /// RS(36,20,17) protecting header data units.
    pub fn rs_36_20_17() -> Self {
        Self::new(36, 20)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Append parity to `data`, which must hold `k` hexbits.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert_eq!(data.len(), self.k, "expected {} data hexbits", self.k);
        let mut padded = data.to_vec();
        padded.resize(self.n, 0);
        let mut word = self.to_word(&padded);
        self.decoder.encode(&mut word);
        self.from_word(&word)
    }

    /// Correct `hexbits`, `n` symbols in transmission order, in place.
    pub fn decode(&self, hexbits: &mut [u8]) -> Integrity {
        assert_eq!(hexbits.len(), self.n, "expected {} hexbits", self.n);
        let mut word = self.to_word(hexbits);
        let integrity = self.decoder.decode(&mut word);
        if let Integrity::Corrected(_) = integrity {
            hexbits.copy_from_slice(&self.from_word(&word));
        }
        integrity
    }

    // First transmitted hexbit is the highest order coefficient.
    fn to_word(&self, hexbits: &[u8]) -> Vec<u8> {
        hexbits.iter().rev().map(|h| h & 0x3f).collect()
    }

    fn from_word(&self, word: &[u8]) -> Vec<u8> {
        word.iter().rev().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn data(k: usize) -> Vec<u8> {
        (0..k).map(|i| ((i * 7 + 3) % 64) as u8).collect()
    }

    fn inject(hexbits: &mut [u8], num: usize) {
        let n = hexbits.len();
        for j in 0..num {
            hexbits[(j * 5 + 1) % n] ^= ((j * 13 + 5) % 63 + 1) as u8;
        }
    }

    #[test]
    fn known_parity() {
        let code = HexbitCode::rs_24_16_9();
        let word = code.encode(&data(16));
        assert_eq!(&word[16..], &[22, 3, 62, 32, 8, 28, 51, 5]);
        let code = HexbitCode::rs_36_20_17();
        let word = code.encode(&data(20));
        assert_eq!(
            &word[20..],
            &[60, 32, 14, 12, 42, 57, 47, 54, 28, 40, 56, 45, 7, 54, 53, 5]
        );
    }

    #[test_case(HexbitCode::rs_24_12_13(), 6)]
    #[test_case(HexbitCode::rs_24_16_9(), 4)]
    #[test_case(HexbitCode::rs_36_20_17(), 8)]
    fn roundtrip_with_errors(code: HexbitCode, t: usize) {
        let expected = code.encode(&data(code.k()));
        assert_eq!(&expected[..code.k()], &data(code.k())[..], "systematic");

        let mut word = expected.clone();
        assert_eq!(code.decode(&mut word), Integrity::Ok);

        for num in 1..=t {
            let mut word = expected.clone();
            inject(&mut word, num);
            assert_eq!(code.decode(&mut word), Integrity::Corrected(num), "{num} errors");
            assert_eq!(word, expected, "{num} errors");
        }

        for num in t + 1..=t + 3 {
            let mut word = expected.clone();
            inject(&mut word, num);
            let received = word.clone();
            assert_eq!(code.decode(&mut word), Integrity::Uncorrectable, "{num} errors");
            assert_eq!(word, received, "{num} errors: word must be untouched");
        }
    }
}
