use num_complex::Complex32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    assembler::{Assembler, Context, Decoders},
    FramerConfig, SyncDetector,
};
use crate::{
    dsp::{Dibit, Slicer},
    message::{Listener, Message},
    Result,
};

/// Number of frames that may be assembled at once. Syncs detected while every
/// assembler is busy are dropped.
pub const ASSEMBLERS: usize = 2;

/// Running counters kept by a [MessageFramer].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FramerStats {
    /// Bits received, status symbols included.
    pub bits: u64,
    pub syncs: u64,
    /// Syncs detected with no free assembler.
    pub dropped_syncs: u64,
    /// NIDs that failed BCH correction.
    pub nid_failures: u64,
    /// Good NIDs carrying a DUID with no defined data unit.
    pub unknown_duids: u64,
    /// Trellis or CRC failures after a good NID.
    pub fec_failures: u64,
    pub dispatched: u64,
}

/// Turns a dibit stream into messages delivered to a [Listener].
///
/// Everything happens on the calling thread; the listener is invoked from within
/// [Self::receive].
pub struct MessageFramer<L: Listener> {
    config: FramerConfig,
    sync: SyncDetector,
    slicer: Slicer,
    decoders: Decoders,
    assemblers: [Assembler; ASSEMBLERS],
    pending: Vec<Message>,
    stats: FramerStats,
    listener: L,
}

impl<L: Listener> MessageFramer<L> {
    /// # Errors
    /// [crate::Error::InvalidConfig] if `config` does not validate.
    pub fn new(config: FramerConfig, listener: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sync: SyncDetector::new(config.sync_pattern, config.sync_bits, config.sync_tolerance),
            slicer: Slicer::new(config.inverted),
            decoders: Decoders::default(),
            assemblers: std::array::from_fn(|_| Assembler::new(&config.lengths)),
            pending: Vec::new(),
            stats: FramerStats::default(),
            listener,
            config,
        })
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Number of assemblers currently collecting a frame.
    pub fn active_assemblers(&self) -> usize {
        self.assemblers.iter().filter(|a| a.is_active()).count()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Slice a differential symbol and frame the resulting dibit.
    pub fn receive_symbol(&mut self, symbol: Complex32) -> Result<()> {
        let dibit = self.slicer.decide(symbol);
        self.process(dibit)
    }

    /// Frame one dibit, remapping it first when the baseband is inverted.
    ///
    /// # Errors
    /// [crate::Error::BufferFull] on an inconsistent frame length table. Corrupt input
    /// never fails.
    pub fn receive(&mut self, dibit: Dibit) -> Result<()> {
        let dibit = if self.config.inverted {
            dibit.inverted()
        } else {
            dibit
        };
        self.process(dibit)
    }

    fn process(&mut self, dibit: Dibit) -> Result<()> {
        self.stats.bits += 2;

        let mut ctx = Context {
            decoders: &self.decoders,
            lengths: &self.config.lengths,
            stats: &mut self.stats,
            pending: &mut self.pending,
        };
        for assembler in self.assemblers.iter_mut().filter(|a| a.is_active()) {
            assembler.receive(dibit, &mut ctx)?;
        }

        if self.sync.receive_dibit(dibit) {
            self.stats.syncs += 1;
            match self.assemblers.iter_mut().find(|a| !a.is_active()) {
                Some(assembler) => assembler.activate(),
                None => {
                    self.stats.dropped_syncs += 1;
                    debug!(
                        dropped = self.stats.dropped_syncs,
                        "sync detected with no free assembler"
                    );
                }
            }
        }

        for message in self.pending.drain(..) {
            self.stats.dispatched += 1;
            self.listener.receive(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bits::BinaryMessage,
        edac::Bch63_16,
        framing::{DataUnitId, SYNC_BITS, SYNC_PATTERN},
    };

    fn sync_dibits() -> Vec<Dibit> {
        (0..SYNC_BITS / 2)
            .map(|i| Dibit::from_value((SYNC_PATTERN >> (SYNC_BITS - 2 - 2 * i)) as u8))
            .collect()
    }

    /// Sync plus a NID. The first status symbol falls after the 11th NID dibit.
    fn nid_frame(nac: u16, duid: u8) -> Vec<Dibit> {
        let mut bits = BinaryMessage::new(64);
        bits.load(0, 64, Bch63_16::new().encode_nid(nac, duid));
        let nid: Vec<Dibit> = (0..32)
            .map(|i| Dibit::from_value(bits.get_range(2 * i, 2 * i + 2) as u8))
            .collect();
        let mut out = sync_dibits();
        out.extend_from_slice(&nid[..11]);
        out.push(Dibit::D01Plus3);
        out.extend_from_slice(&nid[11..]);
        out
    }

    #[test]
    fn terminator_dispatched() {
        let mut framer = MessageFramer::new(FramerConfig::default(), Vec::new()).unwrap();
        for dibit in nid_frame(0x293, 0x3) {
            framer.receive(dibit).unwrap();
        }
        let messages = framer.listener();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].duid(), DataUnitId::Tdu);
        assert_eq!(messages[0].nac(), 0x293);
        assert_eq!(framer.active_assemblers(), 0);
        let stats = framer.stats();
        assert_eq!((stats.syncs, stats.dispatched), (1, 1));
    }

    #[test]
    fn unrecognized_duid_counted() {
        let mut framer = MessageFramer::new(FramerConfig::default(), Vec::new()).unwrap();
        for dibit in nid_frame(0x293, 0x1) {
            framer.receive(dibit).unwrap();
        }
        assert!(framer.listener().is_empty());
        assert_eq!(framer.stats().unknown_duids, 1);
        assert_eq!(framer.active_assemblers(), 0);
    }

    #[test]
    fn inverted_baseband() {
        let config = FramerConfig::builder().inverted(true).build();
        let mut framer = MessageFramer::new(config, Vec::new()).unwrap();
        for dibit in nid_frame(0x1, 0x3) {
            framer.receive(dibit.inverted()).unwrap();
        }
        assert_eq!(framer.listener().len(), 1);
    }

    #[test]
    fn symbols_are_sliced() {
        use std::f32::consts::FRAC_PI_4;

        let mut framer = MessageFramer::new(FramerConfig::default(), Vec::new()).unwrap();
        for dibit in nid_frame(0x1, 0x3) {
            let symbol = Complex32::from_polar(1.0, dibit.phase() + FRAC_PI_4);
            framer.receive_symbol(symbol).unwrap();
        }
        assert_eq!(framer.listener().len(), 1);
    }

    #[test]
    fn closure_listener() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let listener: Box<dyn FnMut(Message) + Send> = Box::new(move |msg: Message| {
            tx.send(msg.nac()).unwrap();
        });
        let mut framer = MessageFramer::new(FramerConfig::default(), listener).unwrap();
        for dibit in nid_frame(0xABC, 0x3) {
            framer.receive(dibit).unwrap();
        }
        assert_eq!(rx.try_recv().unwrap(), 0xABC);
    }
}
