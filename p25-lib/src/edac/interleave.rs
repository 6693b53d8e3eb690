//! Dibit interleaving of trellis coded 196-bit blocks.
use crate::bits::BinaryMessage;

/// Bits in one interleaved block.
pub const BLOCK_BITS: usize = 196;
const BLOCK_DIBITS: usize = BLOCK_BITS / 2;

/// Encoded dibit index carried by each transmitted dibit position.
pub const DATA_INTERLEAVE: [usize; BLOCK_DIBITS] = build_table();

const fn build_table() -> [usize; BLOCK_DIBITS] {
    let mut table = [0usize; BLOCK_DIBITS];
    let mut idx = 0;
    let mut column = 0;
    while column < 4 {
        let mut pair = 2 * column;
        while pair < BLOCK_DIBITS {
            table[idx] = pair;
            table[idx + 1] = pair + 1;
            idx += 2;
            pair += 8;
        }
        column += 1;
    }
    table
}

fn permute(msg: &mut BinaryMessage, start: usize, end: usize, forward: bool) {
    assert_eq!(end - start, BLOCK_BITS, "interleave block must be {BLOCK_BITS} bits");
    let original = msg.get_bits(start, end);
    for (transmitted, encoded) in DATA_INTERLEAVE.iter().enumerate() {
        let (from, to) = if forward {
            (*encoded, transmitted)
        } else {
            (transmitted, *encoded)
        };
        msg.set(start + 2 * to, original[2 * from]);
        msg.set(start + 2 * to + 1, original[2 * from + 1]);
    }
}

/// Restore encoded order for the block at `start..end` in place.
pub fn deinterleave(msg: &mut BinaryMessage, start: usize, end: usize) {
    permute(msg, start, end, false);
}

/// Transmit side inverse of [deinterleave].
pub fn interleave(msg: &mut BinaryMessage, start: usize, end: usize) {
    permute(msg, start, end, true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn table_is_permutation() {
        let mut seen = [false; BLOCK_DIBITS];
        for idx in DATA_INTERLEAVE {
            assert!(!seen[idx], "{idx} repeated");
            seen[idx] = true;
        }
        assert_eq!(&DATA_INTERLEAVE[..6], &[0, 1, 8, 9, 16, 17]);
        assert_eq!(&DATA_INTERLEAVE[24..28], &[96, 97, 2, 3]);
        assert_eq!(DATA_INTERLEAVE[BLOCK_DIBITS - 1], 95);
    }

    #[test]
    fn involution() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let bits: Vec<bool> = (0..260).map(|_| rng.gen()).collect();
            let original = BinaryMessage::from_bits(bits);
            let mut msg = original.clone();
            interleave(&mut msg, 64, 260);
            assert_ne!(msg, original);
            deinterleave(&mut msg, 64, 260);
            assert_eq!(msg, original);
        }
    }

    #[test]
    fn deinterleave_moves_dibits() {
        let mut msg = BinaryMessage::new(BLOCK_BITS);
        // transmitted dibit 2 carries encoded dibit 8
        msg.set(4, true);
        deinterleave(&mut msg, 0, BLOCK_BITS);
        assert!(msg.get(16));
        assert_eq!((0..BLOCK_BITS).filter(|i| msg.get(*i)).count(), 1);
    }
}
