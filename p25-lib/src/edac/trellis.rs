//! Rate 1/2 and rate 3/4 trellis codes over 196-bit blocks.
//!
//! Both codes emit one 4-bit constellation point per input symbol (a dibit for rate
//! 1/2, a tribit for rate 3/4). The encoder state is the previous input symbol, it
//! starts at 0 and a final 0 flushes it, so a block carries 48 data symbols in 49
//! points. Decoding is a hard decision Viterbi search using the Hamming distance
//! between received and expected points.
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Integrity, BLOCK_BITS};
use crate::bits::BinaryMessage;

const POINTS: usize = 49;
const DATA_SYMBOLS: usize = POINTS - 1;

/// Constellation point to transmitted bits, first dibit in the high two bits.
const CONSTELLATION_BITS: [u8; 16] = [
    0b0010, 0b1010, 0b0111, 0b1111, 0b1110, 0b0110, 0b1011, 0b0011, 0b1101, 0b0101, 0b1000,
    0b0000, 0b0001, 0b1001, 0b1100, 0b0100,
];

/// Constellation point for `[state][input]`.
const HALF_RATE: [[u8; 4]; 4] = [[0, 15, 12, 3], [4, 11, 8, 7], [13, 2, 1, 14], [9, 6, 5, 10]];

const THREE_QUARTER_RATE: [[u8; 8]; 8] = [
    [0, 8, 4, 12, 2, 10, 6, 14],
    [4, 12, 2, 10, 6, 14, 0, 8],
    [1, 9, 5, 13, 3, 11, 7, 15],
    [5, 13, 3, 11, 7, 15, 1, 9],
    [3, 11, 7, 15, 1, 9, 5, 13],
    [7, 15, 1, 9, 5, 13, 3, 11],
    [2, 10, 6, 14, 0, 8, 4, 12],
    [6, 14, 0, 8, 4, 12, 2, 10],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrellisRate {
    /// Rate 1/2: 96 data bits per block.
    Half,
    /// Rate 3/4: 144 data bits per block.
    ThreeQuarter,
}

impl TrellisRate {
    fn states(self) -> usize {
        match self {
            Self::Half => 4,
            Self::ThreeQuarter => 8,
        }
    }

    fn symbol_bits(self) -> usize {
        match self {
            Self::Half => 2,
            Self::ThreeQuarter => 3,
        }
    }

    /// Data bits carried by one block.
    pub fn data_bits(self) -> usize {
        DATA_SYMBOLS * self.symbol_bits()
    }

    /// Largest path metric still accepted as a decode.
    fn max_metric(self) -> u32 {
        match self {
            Self::Half => 12,
            Self::ThreeQuarter => 6,
        }
    }

    fn point(self, state: usize, input: usize) -> u8 {
        let point = match self {
            Self::Half => HALF_RATE[state][input],
            Self::ThreeQuarter => THREE_QUARTER_RATE[state][input],
        };
        CONSTELLATION_BITS[usize::from(point)]
    }
}

/// Viterbi decoder for one [TrellisRate].
#[derive(Clone, Debug)]
pub struct Trellis {
    rate: TrellisRate,
}

impl Trellis {
    pub fn new(rate: TrellisRate) -> Self {
        Self { rate }
    }

    pub fn half() -> Self {
        Self::new(TrellisRate::Half)
    }

    pub fn three_quarter() -> Self {
        Self::new(TrellisRate::ThreeQuarter)
    }

    pub fn rate(&self) -> TrellisRate {
        self.rate
    }

    /// Encode `rate.data_bits()` bits read at `start` into a 196-bit block written at
    /// `start`.
    pub fn encode(&self, msg: &mut BinaryMessage, start: usize) {
        let width = self.rate.symbol_bits();
        let inputs: Vec<usize> = (0..DATA_SYMBOLS)
            .map(|i| msg.get_range(start + i * width, start + (i + 1) * width) as usize)
            .chain(std::iter::once(0))
            .collect();
        let mut state = 0;
        for (i, input) in inputs.into_iter().enumerate() {
            msg.load(start + 4 * i, 4, u64::from(self.rate.point(state, input)));
            state = input;
        }
    }

    /// Decode the block at `start..start+196` in place.
    ///
    /// On success the data bits are written at `start` and the remainder of the block is
    /// zeroed. The corrected count of [Integrity::Corrected] is the number of bits that
    /// differed from the best path. When even the best path is too far from the received
    /// points the block is left untouched and [Integrity::Failed] is returned.
    pub fn decode(&self, msg: &mut BinaryMessage, start: usize) -> Integrity {
        let states = self.rate.states();
        let received: Vec<u8> = (0..POINTS)
            .map(|i| msg.get_range(start + 4 * i, start + 4 * (i + 1)) as u8)
            .collect();

        let mut metrics = vec![u32::MAX; states];
        metrics[0] = 0;
        let mut history: Vec<Vec<u8>> = Vec::with_capacity(POINTS);

        for point in &received {
            let mut next = vec![u32::MAX; states];
            let mut predecessors = vec![0u8; states];
            for input in 0..states {
                for (state, metric) in metrics.iter().enumerate() {
                    if *metric == u32::MAX {
                        continue;
                    }
                    let distance = (point ^ self.rate.point(state, input)).count_ones();
                    if metric + distance < next[input] {
                        next[input] = metric + distance;
                        predecessors[input] = state as u8;
                    }
                }
            }
            metrics = next;
            history.push(predecessors);
        }

        let metric = metrics[0];
        if metric > self.rate.max_metric() {
            trace!(rate = ?self.rate, metric, "trellis decode failed");
            return Integrity::Failed;
        }

        // walk back from the flushed zero state; each state is the input that entered it
        let mut inputs = vec![0usize; POINTS];
        let mut state = 0usize;
        for (step, predecessors) in history.iter().enumerate().rev() {
            inputs[step] = state;
            state = usize::from(predecessors[state]);
        }

        let width = self.rate.symbol_bits();
        msg.clear_range(start, start + BLOCK_BITS);
        for (i, input) in inputs.iter().take(DATA_SYMBOLS).enumerate() {
            msg.load(start + i * width, width, *input as u64);
        }

        if metric == 0 {
            Integrity::Ok
        } else {
            Integrity::Corrected(metric as usize)
        }
    }
}
