//! Berlekamp-Massey decoding of Reed-Solomon and BCH codes over GF(2^6).
//!
//! Codewords are slices of field elements where index `i` holds the coefficient of
//! `x^i`. Codes shorter than 63 symbols are shortened codes: the missing high order
//! symbols are implicit zeros, so an error located there makes a word uncorrectable.
use tracing::trace;

use super::Integrity;

/// x^6 + x + 1
const PRIMITIVE_POLY: u16 = 0b100_0011;
const FIELD_BITS: usize = 6;
/// Number of non-zero field elements, and the longest code length.
pub const FIELD_ORDER: usize = (1 << FIELD_BITS) - 1;

/// GF(2^6) arithmetic by exponent and logarithm tables.
#[derive(Clone, Debug)]
pub struct GaloisField {
    /// Doubled so sums of two logs index without a modulo.
    exp: [u8; 2 * FIELD_ORDER],
    /// `log[0]` is unused.
    log: [u8; FIELD_ORDER + 1],
}

impl Default for GaloisField {
    fn default() -> Self {
        Self::new()
    }
}

impl GaloisField {
    pub fn new() -> Self {
        let mut exp = [0u8; 2 * FIELD_ORDER];
        let mut log = [0u8; FIELD_ORDER + 1];
        let mut x: u16 = 1;
        for i in 0..FIELD_ORDER {
            exp[i] = x as u8;
            exp[i + FIELD_ORDER] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & (1 << FIELD_BITS) != 0 {
                x ^= PRIMITIVE_POLY;
            }
        }
        Self { exp, log }
    }

    /// α^power for any, possibly negative, power.
    pub fn pow(&self, power: isize) -> u8 {
        self.exp[power.rem_euclid(FIELD_ORDER as isize) as usize]
    }

    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[usize::from(self.log[usize::from(a)]) + usize::from(self.log[usize::from(b)])]
    }

    /// # Panics
    /// On division by zero.
    pub fn div(&self, a: u8, b: u8) -> u8 {
        assert!(b != 0, "division by zero in GF(64)");
        if a == 0 {
            return 0;
        }
        let power = isize::from(self.log[usize::from(a)]) - isize::from(self.log[usize::from(b)]);
        self.pow(power)
    }

    /// Evaluate `poly`, lowest order coefficient first, at `x`.
    pub fn eval(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().rev().fold(0, |acc, c| self.mul(acc, x) ^ c)
    }
}

/// Decoder for a code with designed correction capability `t` whose generator has the
/// consecutive roots α^1..α^2t.
#[derive(Clone, Debug)]
pub struct BerlekampMassey {
    field: GaloisField,
    t: usize,
    /// Generator polynomial, lowest order first, degree 2t.
    generator: Vec<u8>,
}

impl BerlekampMassey {
    /// # Panics
    /// If `t` is zero or leaves no room for data in a 63 symbol code.
    pub fn new(t: usize) -> Self {
        assert!(t > 0 && 2 * t < FIELD_ORDER, "invalid correction capability {t}");
        let field = GaloisField::new();
        let mut generator = vec![1u8];
        for i in 1..=2 * t {
            let root = field.pow(i as isize);
            let mut next = vec![0u8; generator.len() + 1];
            for (j, c) in generator.iter().enumerate() {
                next[j + 1] ^= c;
                next[j] ^= field.mul(*c, root);
            }
            generator = next;
        }
        Self {
            field,
            t,
            generator,
        }
    }

    pub fn t(&self) -> usize {
        self.t
    }

    pub fn field(&self) -> &GaloisField {
        &self.field
    }

    pub fn generator(&self) -> &[u8] {
        &self.generator
    }

    /// Fill the `2t` parity symbols (indexes `0..2t`) of a systematic codeword whose data
    /// symbols occupy the remaining indexes.
    pub fn encode(&self, word: &mut [u8]) {
        let parity = 2 * self.t;
        let mut remainder = word.to_vec();
        remainder[..parity].iter_mut().for_each(|c| *c = 0);
        for degree in (parity..word.len()).rev() {
            let coef = remainder[degree];
            if coef == 0 {
                continue;
            }
            for (j, g) in self.generator.iter().enumerate() {
                remainder[degree - parity + j] ^= self.field.mul(coef, *g);
            }
        }
        word[..parity].copy_from_slice(&remainder[..parity]);
    }

    /// Syndromes S1..S2t.
    fn syndromes(&self, word: &[u8]) -> Vec<u8> {
        (1..=2 * self.t)
            .map(|j| self.field.eval(word, self.field.pow(j as isize)))
            .collect()
    }

    /// Error locator polynomial by the Berlekamp-Massey recursion, and its length.
    fn locator(&self, syndromes: &[u8]) -> (Vec<u8>, usize) {
        let f = &self.field;
        let mut current = vec![1u8];
        let mut previous = vec![1u8];
        let mut length = 0usize;
        let mut shift = 1usize;
        let mut previous_discrepancy = 1u8;

        for r in 0..syndromes.len() {
            let mut discrepancy = syndromes[r];
            for i in 1..=length.min(current.len() - 1) {
                discrepancy ^= f.mul(current[i], syndromes[r - i]);
            }
            if discrepancy == 0 {
                shift += 1;
                continue;
            }

            let scale = f.div(discrepancy, previous_discrepancy);
            let saved = current.clone();
            if current.len() < previous.len() + shift {
                current.resize(previous.len() + shift, 0);
            }
            for (i, b) in previous.iter().enumerate() {
                current[i + shift] ^= f.mul(scale, *b);
            }

            if 2 * length <= r {
                length = r + 1 - length;
                previous = saved;
                previous_discrepancy = discrepancy;
                shift = 1;
            } else {
                shift += 1;
            }
        }

        while current.len() > 1 && current[current.len() - 1] == 0 {
            current.pop();
        }
        (current, length)
    }

    /// Correct `word` in place.
    ///
    /// Returns [Integrity::Ok] when all syndromes are zero, [Integrity::Corrected] with the
    /// number of repaired symbols, or [Integrity::Uncorrectable] leaving `word` untouched
    /// when the errors exceed the code's capability.
    pub fn decode(&self, word: &mut [u8]) -> Integrity {
        self.decode_inner(word, false)
    }

    /// Like [Self::decode] for binary BCH codewords: each element is a bit and every error
    /// magnitude must be 1.
    pub fn decode_binary(&self, word: &mut [u8]) -> Integrity {
        self.decode_inner(word, true)
    }

    fn decode_inner(&self, word: &mut [u8], binary: bool) -> Integrity {
        debug_assert!(word.len() <= FIELD_ORDER);
        let f = &self.field;
        let syndromes = self.syndromes(word);
        if syndromes.iter().all(|s| *s == 0) {
            return Integrity::Ok;
        }

        let (locator, length) = self.locator(&syndromes);
        if locator.len() - 1 != length || length > self.t {
            trace!(length, degree = locator.len() - 1, "locator degree mismatch");
            return Integrity::Uncorrectable;
        }

        // Chien search: an error at position i makes α^-i a root
        let positions: Vec<usize> = (0..FIELD_ORDER)
            .filter(|i| f.eval(&locator, f.pow(-(*i as isize))) == 0)
            .collect();
        if positions.len() != length {
            trace!(roots = positions.len(), length, "root count mismatch");
            return Integrity::Uncorrectable;
        }
        if positions.iter().any(|p| *p >= word.len()) {
            trace!("error located in shortened region");
            return Integrity::Uncorrectable;
        }

        // Forney: evaluator = S(x)Λ(x) mod x^2t, magnitude = Ω(X⁻¹) / Λ'(X⁻¹)
        let parity = 2 * self.t;
        let mut evaluator = vec![0u8; parity];
        for (i, s) in syndromes.iter().enumerate() {
            for (j, l) in locator.iter().enumerate() {
                if i + j < parity {
                    evaluator[i + j] ^= f.mul(*s, *l);
                }
            }
        }
        let derivative: Vec<u8> = (1..locator.len())
            .map(|i| if i % 2 == 1 { locator[i] } else { 0 })
            .collect();

        let mut magnitudes = Vec::with_capacity(positions.len());
        for position in &positions {
            let x_inv = f.pow(-(*position as isize));
            let denominator = f.eval(&derivative, x_inv);
            if denominator == 0 {
                return Integrity::Uncorrectable;
            }
            let magnitude = f.div(f.eval(&evaluator, x_inv), denominator);
            if magnitude == 0 || (binary && magnitude != 1) {
                return Integrity::Uncorrectable;
            }
            magnitudes.push(magnitude);
        }

        for (position, magnitude) in positions.iter().zip(magnitudes) {
            word[*position] ^= magnitude;
        }
        Integrity::Corrected(positions.len())
    }
}
