use crate::dsp::Dibit;

/// Sliding correlator over the most recent 64 bits.
///
/// A match is reported when the newest `bits` bits differ from the pattern in no more
/// than `tolerance` positions. Nothing matches until at least `bits` bits were seen.
#[derive(Clone, Debug)]
pub struct SyncDetector {
    pattern: u64,
    mask: u64,
    bits: usize,
    tolerance: u32,
    register: u64,
    seen: usize,
}

impl SyncDetector {
    /// # Panics
    /// If `bits` is zero or more than 64.
    pub fn new(pattern: u64, bits: usize, tolerance: u32) -> Self {
        assert!(bits > 0 && bits <= 64, "invalid sync width {bits}");
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        Self {
            pattern: pattern & mask,
            mask,
            bits,
            tolerance,
            register: 0,
            seen: 0,
        }
    }

    /// Shift in one bit and report whether the pattern now ends at it.
    pub fn receive(&mut self, bit: bool) -> bool {
        self.register = (self.register << 1) | u64::from(bit);
        self.seen = (self.seen + 1).min(64);
        self.matches()
    }

    /// Shift in both bits of `dibit`. Matches are only tested on the dibit boundary.
    pub fn receive_dibit(&mut self, dibit: Dibit) -> bool {
        self.receive(dibit.bit1());
        self.receive(dibit.bit2())
    }

    pub fn matches(&self) -> bool {
        self.seen >= self.bits && self.errors() <= self.tolerance
    }

    /// Bits that differ between the register and the pattern.
    pub fn errors(&self) -> u32 {
        ((self.register ^ self.pattern) & self.mask).count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{SYNC_BITS, SYNC_PATTERN};

    fn dibits(value: u64, bits: usize) -> Vec<Dibit> {
        (0..bits / 2)
            .map(|i| Dibit::from_value((value >> (bits - 2 - 2 * i)) as u8))
            .collect()
    }

    #[test]
    fn matches_on_last_bit() {
        let mut sync = SyncDetector::new(SYNC_PATTERN, SYNC_BITS, 0);
        let stream = dibits(SYNC_PATTERN, SYNC_BITS);
        let (last, head) = stream.split_last().unwrap();
        for dibit in head {
            assert!(!sync.receive_dibit(*dibit));
        }
        assert!(sync.receive_dibit(*last));
        assert!(!sync.receive_dibit(Dibit::D00Plus1), "match must not persist");
    }

    #[test]
    fn single_bit_error_rejected_without_tolerance() {
        for flip in 0..SYNC_BITS {
            let mut exact = SyncDetector::new(SYNC_PATTERN, SYNC_BITS, 0);
            let mut tolerant = SyncDetector::new(SYNC_PATTERN, SYNC_BITS, 1);
            let corrupted = SYNC_PATTERN ^ (1 << flip);
            let mut hit = (false, false);
            for dibit in dibits(corrupted, SYNC_BITS) {
                hit = (exact.receive_dibit(dibit), tolerant.receive_dibit(dibit));
            }
            assert_eq!(hit, (false, true), "bit {flip}");
        }
    }

    #[test]
    fn leading_zeros_need_history() {
        // an all zero pattern must not match a fresh register
        let mut sync = SyncDetector::new(0, 8, 0);
        assert!(!sync.receive_dibit(Dibit::D00Plus1));
        for _ in 0..2 {
            sync.receive_dibit(Dibit::D00Plus1);
        }
        assert!(sync.receive_dibit(Dibit::D00Plus1));
        assert!(!SyncDetector::new(0, 8, 0).matches());
    }

    #[test]
    fn full_width_pattern() {
        let pattern = 0x5575_F5FF_77FF_0F0F;
        let mut sync = SyncDetector::new(pattern, 64, 0);
        let mut hit = false;
        for dibit in dibits(pattern, 64) {
            hit = sync.receive_dibit(dibit);
        }
        assert!(hit);
        assert_eq!(sync.errors(), 0);
    }
}
