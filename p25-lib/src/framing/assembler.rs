//! One frame assembler and the data unit state machine it runs.
use tracing::{debug, trace};

use super::{FrameLengths, FrameState, FramerStats};
use crate::{
    bits::BinaryMessage,
    dsp::Dibit,
    edac::{correct_ccitt80, deinterleave, Bch63_16, Golay, HexbitCode, Trellis, BLOCK_BITS},
    framing::DataUnitId,
    message::{
        DataUnit, HeaderDataUnit, LogicalLinkDataUnit1, LogicalLinkDataUnit2, Message,
        PacketDataUnit, PduHeader, TerminatorDataUnit, TerminatorLinkControl, Tsbk,
        UnknownDataUnit,
    },
    Result,
};

/// A status symbol follows every 35 data dibits, counted from the start of sync.
const STATUS_INTERVAL: usize = 35;
/// Dibits of sync already received when an assembler is activated.
const SYNC_DIBITS: usize = 24;

/// Data follows the NID.
const DATA_START: usize = 64;
/// End of the decoded header block, where data blocks start.
const HEADER_END: usize = 160;
const UNCONFIRMED_DATA_BITS: usize = 96;
/// Bits a rate 3/4 block shrinks by once decoded.
const CONFIRMED_OVERHEAD: usize = BLOCK_BITS - 144;

/// Decoders shared by every assembler of a framer.
#[derive(Clone, Debug)]
pub(crate) struct Decoders {
    pub bch: Bch63_16,
    pub golay: Golay,
    pub link_control: HexbitCode,
    pub encryption_sync: HexbitCode,
    pub header: HexbitCode,
    pub half: Trellis,
    pub three_quarter: Trellis,
}

impl Default for Decoders {
    fn default() -> Self {
        Self {
            bch: Bch63_16::new(),
            golay: Golay::new(),
            link_control: HexbitCode::rs_24_12_13(),
            encryption_sync: HexbitCode::rs_24_16_9(),
            header: HexbitCode::rs_36_20_17(),
            half: Trellis::half(),
            three_quarter: Trellis::three_quarter(),
        }
    }
}

/// Shared inputs and outputs for one step of an assembler.
pub(crate) struct Context<'a> {
    pub decoders: &'a Decoders,
    pub lengths: &'a FrameLengths,
    pub stats: &'a mut FramerStats,
    pub pending: &'a mut Vec<Message>,
}

impl Context<'_> {
    fn dispatch(&mut self, message: Message) {
        trace!(duid = %message.duid(), nac = message.nac(), "dispatch");
        self.pending.push(message);
    }

    fn fec_failure(&mut self, state: FrameState) {
        trace!(%state, "fec failure");
        self.stats.fec_failures += 1;
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Assembler {
    active: bool,
    complete: bool,
    state: FrameState,
    bits: BinaryMessage,
    status_counter: usize,
    nac: u16,
    duid: u8,
}

impl Assembler {
    pub fn new(lengths: &FrameLengths) -> Self {
        Self {
            active: false,
            complete: false,
            state: FrameState::Nid,
            bits: BinaryMessage::new(lengths.nid),
            status_counter: SYNC_DIBITS,
            nac: 0,
            duid: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Start collecting a frame whose sync just ended.
    pub fn activate(&mut self) {
        self.active = true;
    }

    fn reset(&mut self, lengths: &FrameLengths) {
        *self = Self::new(lengths);
    }

    /// Add one dibit, skipping status symbols, and advance the state machine whenever
    /// the frame fills up. A completed frame returns the assembler to NID search.
    ///
    /// # Errors
    /// [crate::Error::BufferFull] if the state machine left a full buffer behind, which
    /// can only follow from an inconsistent length table.
    pub fn receive(&mut self, dibit: Dibit, ctx: &mut Context<'_>) -> Result<()> {
        if self.status_counter == STATUS_INTERVAL {
            self.status_counter = 0;
            return Ok(());
        }
        self.status_counter += 1;

        self.bits.add(dibit.bit1())?;
        self.bits.add(dibit.bit2())?;

        while self.bits.is_full() && !self.complete {
            self.step(ctx);
        }
        if self.complete {
            self.reset(ctx.lengths);
        }
        Ok(())
    }

    fn step(&mut self, ctx: &mut Context<'_>) {
        match self.state {
            FrameState::Nid => self.nid(ctx),
            FrameState::Hdu => {
                let hdu = HeaderDataUnit::decode(
                    self.nac,
                    self.bits.clone(),
                    &ctx.decoders.golay,
                    &ctx.decoders.header,
                );
                self.finish(ctx, Message::Hdu(hdu));
            }
            FrameState::Tdu => {
                let unit = DataUnit::new(self.nac, DataUnitId::Tdu, true, self.bits.clone());
                self.finish(ctx, Message::Tdu(TerminatorDataUnit { unit }));
            }
            FrameState::Ldu1 => {
                let ldu = LogicalLinkDataUnit1::decode(
                    self.nac,
                    self.bits.clone(),
                    &ctx.decoders.link_control,
                );
                self.finish(ctx, Message::Ldu1(ldu));
            }
            FrameState::Ldu2 => {
                let ldu = LogicalLinkDataUnit2::decode(
                    self.nac,
                    self.bits.clone(),
                    &ctx.decoders.encryption_sync,
                );
                self.finish(ctx, Message::Ldu2(ldu));
            }
            FrameState::Tdulc => {
                let tdulc = TerminatorLinkControl::decode(
                    self.nac,
                    self.bits.clone(),
                    &ctx.decoders.golay,
                    &ctx.decoders.link_control,
                );
                self.finish(ctx, Message::Tdulc(tdulc));
            }
            FrameState::Unknown => {
                let unit = DataUnit::new(self.nac, DataUnitId::Unknown, true, self.bits.clone());
                let unknown = UnknownDataUnit {
                    unit,
                    value: self.duid,
                };
                self.finish(ctx, Message::Unknown(unknown));
            }
            FrameState::Tsbk1 | FrameState::Tsbk2 | FrameState::Tsbk3 => self.tsbk(ctx),
            FrameState::Pdu0 => self.pdu_header(ctx),
            FrameState::Pdu1 | FrameState::Pdu2 | FrameState::Pdu3 => self.pdu_block(ctx),
            FrameState::Pduc => self.pdu_confirmed(ctx),
        }
    }

    fn finish(&mut self, ctx: &mut Context<'_>, message: Message) {
        ctx.dispatch(message);
        self.complete = true;
    }

    fn nid(&mut self, ctx: &mut Context<'_>) {
        let integrity = ctx.decoders.bch.decode(&mut self.bits);
        if !integrity.ok() {
            trace!("nid uncorrectable");
            ctx.stats.nid_failures += 1;
            self.complete = true;
            return;
        }
        self.nac = self.bits.get_range(0, 12) as u16;
        self.duid = self.bits.get_range(12, 16) as u8;

        match FrameState::from_duid(self.duid) {
            Some(state) => {
                trace!(nac = self.nac, %state, errors = integrity.corrections(), "nid");
                self.state = state;
                self.bits.set_size(ctx.lengths.length(state));
            }
            None => {
                debug!(nac = self.nac, duid = self.duid, "unrecognized duid");
                ctx.stats.unknown_duids += 1;
                self.complete = true;
            }
        }
    }

    /// Deinterleave and trellis decode the block at `start`.
    fn decode_block(&mut self, ctx: &mut Context<'_>, start: usize, trellis: &Trellis) -> bool {
        deinterleave(&mut self.bits, start, start + BLOCK_BITS);
        let ok = trellis.decode(&mut self.bits, start).ok();
        if !ok {
            ctx.fec_failure(self.state);
        }
        ok
    }

    fn tsbk(&mut self, ctx: &mut Context<'_>) {
        let decoders = ctx.decoders;
        if !self.decode_block(ctx, DATA_START, &decoders.half) {
            self.complete = true;
            return;
        }
        if !correct_ccitt80(&mut self.bits, DATA_START).ok() {
            ctx.fec_failure(self.state);
            self.complete = true;
            return;
        }

        let mut bits = self.bits.clone();
        bits.set_size(HEADER_END);
        let tsbk = Tsbk::parse(self.nac, bits);
        let last = tsbk.last_block;
        ctx.dispatch(Message::Tsbk(tsbk));

        self.state = match self.state {
            FrameState::Tsbk1 if !last => FrameState::Tsbk2,
            FrameState::Tsbk2 if !last => FrameState::Tsbk3,
            _ => {
                self.complete = true;
                return;
            }
        };
        self.bits.set_pointer(DATA_START);
    }

    fn blocks_to_follow(&self) -> usize {
        usize::from(PduHeader::parse(&self.bits).blocks_to_follow)
    }

    fn dispatch_pdu(&mut self, ctx: &mut Context<'_>, decoded: bool) {
        let pdu = PacketDataUnit::decode(self.nac, self.bits.clone(), decoded);
        self.finish(ctx, Message::Pdu(pdu));
    }

    fn pdu_header(&mut self, ctx: &mut Context<'_>) {
        let decoders = ctx.decoders;
        if !self.decode_block(ctx, DATA_START, &decoders.half) {
            self.complete = true;
            return;
        }

        let header = PduHeader::parse(&self.bits);
        if header.blocks_to_follow == 0 {
            self.bits.set_size(HEADER_END);
            self.dispatch_pdu(ctx, true);
            return;
        }
        self.state = if header.confirmed {
            FrameState::Pduc
        } else {
            FrameState::Pdu1
        };
        self.bits.set_size(ctx.lengths.length(self.state));
        self.bits.set_pointer(HEADER_END);
    }

    /// Unconfirmed data blocks. The last stage dispatches whatever it has, even when its
    /// own block fails to decode.
    fn pdu_block(&mut self, ctx: &mut Context<'_>) {
        let (received, next) = match self.state {
            FrameState::Pdu1 => (1, Some(FrameState::Pdu2)),
            FrameState::Pdu2 => (2, Some(FrameState::Pdu3)),
            _ => (3, None),
        };
        let start = HEADER_END + (received - 1) * UNCONFIRMED_DATA_BITS;
        let end = start + UNCONFIRMED_DATA_BITS;

        let decoders = ctx.decoders;
        let decoded = self.decode_block(ctx, start, &decoders.half);
        match next {
            Some(_) if !decoded => self.complete = true,
            Some(next) if received < self.blocks_to_follow() => {
                self.state = next;
                self.bits.set_size(ctx.lengths.length(next));
                self.bits.set_pointer(end);
            }
            _ => {
                self.bits.set_size(end);
                self.dispatch_pdu(ctx, decoded);
            }
        }
    }

    /// Confirmed data blocks arrive one at a time at the end of the frame, which grows by
    /// a block until every announced block is in.
    fn pdu_confirmed(&mut self, ctx: &mut Context<'_>) {
        let size = self.bits.size();
        let start = size - BLOCK_BITS;
        let decoders = ctx.decoders;
        if !self.decode_block(ctx, start, &decoders.three_quarter) {
            self.bits.set_size(start);
            self.dispatch_pdu(ctx, false);
            return;
        }

        // the pointer follows the size down to the end of the decoded data
        self.bits.set_size(size - CONFIRMED_OVERHEAD);
        let received = (self.bits.size() - HEADER_END) / (BLOCK_BITS - CONFIRMED_OVERHEAD);
        if received < self.blocks_to_follow() {
            self.bits.set_size(self.bits.size() + BLOCK_BITS);
        } else {
            self.dispatch_pdu(ctx, true);
        }
    }
}
