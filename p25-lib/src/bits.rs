//! Bit addressable message buffer.
//!
//! Bits are numbered from 0 in transmission order. Multi-bit fields are read and
//! written most significant bit first, matching how P25 fields are laid out over the
//! air.
use std::fmt;

use crate::{Error, Result};

const WORD_BITS: usize = 64;

fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

fn mask(idx: usize) -> u64 {
    1u64 << (WORD_BITS - 1 - idx % WORD_BITS)
}

/// A fixed size bit buffer with a write pointer.
///
/// The buffer holds exactly [Self::size] bits. Bits are appended at the pointer with
/// [Self::add] until the buffer [is full](Self::is_full); appending past that is the
/// [Error::BufferFull] invariant violation.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BinaryMessage {
    words: Vec<u64>,
    size: usize,
    pointer: usize,
}

impl BinaryMessage {
    /// Create a zeroed message of `size` bits with the pointer at 0.
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![0; words_for(size)],
            size,
            pointer: 0,
        }
    }

    /// Create a full message from the given bits.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let bits: Vec<bool> = bits.into_iter().collect();
        let mut msg = Self::new(bits.len());
        for (idx, bit) in bits.into_iter().enumerate() {
            msg.set(idx, bit);
        }
        msg.pointer = msg.size;
        msg
    }

    /// Create a full message of `size` bits from MSB-first packed bytes.
    pub fn from_bytes(dat: &[u8], size: usize) -> Self {
        Self::from_bits((0..size).map(|idx| {
            dat.get(idx / 8)
                .is_some_and(|b| b & (0x80 >> (idx % 8)) != 0)
        }))
    }

    /// Declared number of bits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current write pointer.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn is_full(&self) -> bool {
        self.pointer >= self.size
    }

    pub fn is_empty(&self) -> bool {
        self.pointer == 0
    }

    /// Append a bit at the pointer.
    ///
    /// # Errors
    /// [Error::BufferFull] if the pointer already equals the declared size.
    pub fn add(&mut self, bit: bool) -> Result<()> {
        if self.pointer >= self.size {
            return Err(Error::BufferFull {
                capacity: self.size,
            });
        }
        self.set(self.pointer, bit);
        self.pointer += 1;
        Ok(())
    }

    /// Get the bit at `idx`. Bits beyond the declared size read as `false`.
    pub fn get(&self, idx: usize) -> bool {
        idx < self.size && self.words[idx / WORD_BITS] & mask(idx) != 0
    }

    /// Set the bit at `idx`.
    ///
    /// # Panics
    /// If `idx` is not less than the declared size.
    pub fn set(&mut self, idx: usize, bit: bool) {
        assert!(idx < self.size, "bit {idx} out of range for size {}", self.size);
        if bit {
            self.words[idx / WORD_BITS] |= mask(idx);
        } else {
            self.words[idx / WORD_BITS] &= !mask(idx);
        }
    }

    pub fn flip(&mut self, idx: usize) {
        let bit = self.get(idx);
        self.set(idx, !bit);
    }

    /// Read the bits at the given indexes as an integer, first index most significant.
    pub fn get_int(&self, indexes: &[usize]) -> u32 {
        debug_assert!(indexes.len() <= 32);
        indexes
            .iter()
            .fold(0u32, |acc, idx| (acc << 1) | u32::from(self.get(*idx)))
    }

    /// Read the bits in `start..end` as an integer, `start` most significant.
    pub fn get_range(&self, start: usize, end: usize) -> u64 {
        debug_assert!(end - start <= 64);
        (start..end).fold(0u64, |acc, idx| (acc << 1) | u64::from(self.get(idx)))
    }

    /// Copy out the bits in `start..end`.
    pub fn get_bits(&self, start: usize, end: usize) -> Vec<bool> {
        (start..end).map(|idx| self.get(idx)).collect()
    }

    /// Write the low `width` bits of `value` at `start`, most significant first.
    pub fn load(&mut self, start: usize, width: usize, value: u64) {
        for i in 0..width {
            self.set(start + i, (value >> (width - 1 - i)) & 1 == 1);
        }
    }

    /// Zero the bits in `start..end`.
    pub fn clear_range(&mut self, start: usize, end: usize) {
        for idx in start..end.min(self.size) {
            self.set(idx, false);
        }
    }

    /// Zero every bit and reset the pointer.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
        self.pointer = 0;
    }

    /// Change the declared size, keeping the bits that still fit.
    ///
    /// Bits past a reduced size are zeroed so that a later grow exposes zeros. The
    /// pointer is clamped to the new size.
    pub fn set_size(&mut self, size: usize) {
        if size < self.size {
            self.clear_range(size, self.size);
        }
        self.words.resize(words_for(size), 0);
        self.size = size;
        self.pointer = self.pointer.min(size);
    }

    /// Move the pointer, clamped to the declared size.
    pub fn set_pointer(&mut self, pointer: usize) {
        self.pointer = pointer.min(self.size);
    }

    /// Pack the declared bits MSB first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.size.div_ceil(8)];
        for idx in 0..self.size {
            if self.get(idx) {
                out[idx / 8] |= 0x80 >> (idx % 8);
            }
        }
        out
    }

    /// Pack `start..end` MSB first into whole octets; a trailing partial octet is
    /// left aligned.
    pub fn bytes_in(&self, start: usize, end: usize) -> Vec<u8> {
        let mut out = vec![0u8; (end - start).div_ceil(8)];
        for (i, idx) in (start..end).enumerate() {
            if self.get(idx) {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }
}

impl fmt::Display for BinaryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for idx in 0..self.size {
            f.write_str(if self.get(idx) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BinaryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryMessage")
            .field("size", &self.size)
            .field("pointer", &self.pointer)
            .field("bits", &self.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_until_full() {
        let mut msg = BinaryMessage::new(3);
        assert!(msg.is_empty());
        msg.add(true).unwrap();
        msg.add(false).unwrap();
        msg.add(true).unwrap();
        assert!(msg.is_full());

        let zult = msg.add(true);
        assert!(
            matches!(zult, Err(Error::BufferFull { capacity: 3 })),
            "got {zult:?}"
        );
        assert_eq!(msg.pointer(), 3, "pointer must never exceed size");
        assert_eq!(msg.to_string(), "101");
    }

    #[test]
    fn get_int_uses_index_order() {
        let msg = BinaryMessage::from_bits([true, false, false, true, true]);
        assert_eq!(msg.get_int(&[0, 1, 2]), 0b100);
        assert_eq!(msg.get_int(&[4, 3, 0]), 0b111);
        assert_eq!(msg.get_range(1, 5), 0b0011);
    }

    #[test]
    fn load_spans_words() {
        let mut msg = BinaryMessage::new(130);
        msg.load(60, 10, 0x3A5);
        assert_eq!(msg.get_range(60, 70), 0x3A5);
        msg.load(120, 10, 0x2F1);
        assert_eq!(msg.get_range(120, 130), 0x2F1);
        assert_eq!(msg.get_range(70, 120), 0);
    }

    #[test]
    fn shrink_then_grow_exposes_zeros() {
        let mut msg = BinaryMessage::from_bits(std::iter::repeat(true).take(100));
        msg.set_size(70);
        assert_eq!(msg.pointer(), 70);
        msg.set_size(100);
        assert!(msg.get(69));
        assert!(!msg.get(70));
        assert!(!msg.get(99));
        assert!(!msg.is_full());
    }

    #[test]
    fn clone_is_deep() {
        let mut a = BinaryMessage::from_bits([true, true]);
        let b = a.clone();
        a.set(0, false);
        assert!(b.get(0));
        assert_ne!(a, b);
    }

    #[test]
    fn bytes_roundtrip() {
        let dat = [0xA5u8, 0x0F, 0xC0];
        let msg = BinaryMessage::from_bytes(&dat, 18);
        assert_eq!(msg.to_bytes(), vec![0xA5, 0x0F, 0xC0]);
        assert_eq!(msg.bytes_in(4, 16), vec![0x50, 0xF0]);
    }
}
