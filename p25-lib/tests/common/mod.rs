#![allow(dead_code)]
//! Synthetic P25 transmitter: frame bits, status symbols, dibits and π/4-DQPSK samples.
use std::f32::consts::TAU;

use num_complex::Complex32;
use p25::{
    bits::BinaryMessage,
    dsp::Dibit,
    edac::{interleave, Bch63_16, HexbitCode, Trellis, BLOCK_BITS},
    framing::{SYNC_BITS, SYNC_PATTERN},
    message::{
        EncryptionSync, HeaderDataUnit, LinkControl, LogicalLinkDataUnit1,
        LogicalLinkDataUnit2, TerminatorLinkControl,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const NAC: u16 = 0x293;
pub const STATUS: Dibit = Dibit::D01Plus3;
const STATUS_INTERVAL: usize = 35;

pub fn sync() -> BinaryMessage {
    let mut bits = BinaryMessage::new(SYNC_BITS);
    bits.load(0, SYNC_BITS, SYNC_PATTERN);
    bits
}

pub fn nid(nac: u16, duid: u8) -> BinaryMessage {
    let mut bits = BinaryMessage::new(64);
    bits.load(0, 64, Bch63_16::new().encode_nid(nac, duid));
    bits
}

pub fn concat(parts: &[BinaryMessage]) -> BinaryMessage {
    BinaryMessage::from_bits(parts.iter().flat_map(|p| p.get_bits(0, p.size())))
}

pub fn dibits(bits: &BinaryMessage) -> Vec<Dibit> {
    (0..bits.size() / 2)
        .map(|i| Dibit::from_value(bits.get_range(2 * i, 2 * i + 2) as u8))
        .collect()
}

/// Sync followed by `body`, with a status symbol after every 35 dibits counted from the
/// start of sync.
pub fn transmit(body: &BinaryMessage) -> Vec<Dibit> {
    let mut out = Vec::new();
    let mut since = 0;
    for dibit in dibits(&concat(&[sync(), body.clone()])) {
        if since == STATUS_INTERVAL {
            out.push(STATUS);
            since = 0;
        }
        out.push(dibit);
        since += 1;
    }
    out
}

pub fn random_dibits(num: usize, seed: u64) -> Vec<Dibit> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num)
        .map(|_| Dibit::from_value(rng.gen_range(0..4)))
        .collect()
}

/// Trellis encode `data` and interleave the resulting block.
pub fn encoded_block(data: &BinaryMessage, trellis: &Trellis) -> BinaryMessage {
    let mut block = BinaryMessage::new(BLOCK_BITS);
    for idx in 0..data.size() {
        block.set(idx, data.get(idx));
    }
    trellis.encode(&mut block, 0);
    interleave(&mut block, 0, BLOCK_BITS);
    block
}

pub fn group_voice(talkgroup: u16, source: u32) -> LinkControl {
    let mut word = BinaryMessage::new(72);
    word.load(32, 16, u64::from(talkgroup));
    word.load(48, 24, u64::from(source));
    LinkControl::parse(&word)
}

pub fn tdu(nac: u16) -> BinaryMessage {
    nid(nac, 0x3)
}

pub fn ldu1(nac: u16, lc: &LinkControl) -> BinaryMessage {
    let mut bits = BinaryMessage::new(1632);
    LogicalLinkDataUnit1::encode(lc, &mut bits, &HexbitCode::rs_24_12_13());
    bits.load(0, 64, nid(nac, 0x5).get_range(0, 64));
    bits
}

pub fn ldu2(nac: u16, es: &EncryptionSync) -> BinaryMessage {
    let mut bits = BinaryMessage::new(1632);
    LogicalLinkDataUnit2::encode(es, &mut bits, &HexbitCode::rs_24_16_9());
    bits.load(0, 64, nid(nac, 0xA).get_range(0, 64));
    bits
}

pub fn tdulc(nac: u16, lc: &LinkControl) -> BinaryMessage {
    let mut bits = BinaryMessage::new(352);
    TerminatorLinkControl::encode(lc, &mut bits, &HexbitCode::rs_24_12_13());
    bits.load(0, 64, nid(nac, 0xF).get_range(0, 64));
    bits
}

pub fn hdu(nac: u16, header: &HeaderDataUnit) -> BinaryMessage {
    let mut bits = BinaryMessage::new(712);
    header.encode(&mut bits, &HexbitCode::rs_36_20_17());
    bits.load(0, 64, nid(nac, 0x0).get_range(0, 64));
    bits
}

/// One TSBK frame per 96-bit block.
pub fn tsbk(nac: u16, blocks: &[BinaryMessage]) -> BinaryMessage {
    let half = Trellis::half();
    let mut parts = vec![nid(nac, 0x7)];
    parts.extend(blocks.iter().map(|b| encoded_block(b, &half)));
    concat(&parts)
}

/// Rectangular pulse π/4-DQPSK with a carrier offset in radians per sample.
pub fn modulate(dibits: &[Dibit], samples_per_symbol: usize, offset: f32) -> Vec<Complex32> {
    let mut phase = 0.0f32;
    let mut carrier = 0.0f32;
    let mut samples = Vec::with_capacity(dibits.len() * samples_per_symbol);
    for dibit in dibits {
        phase = (phase + dibit.phase()) % TAU;
        for _ in 0..samples_per_symbol {
            samples.push(Complex32::from_polar(1.0, phase + carrier));
            carrier = (carrier + offset) % TAU;
        }
    }
    samples
}

/// Interleaved little-endian f32 I/Q.
pub fn iq_bytes(samples: &[Complex32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| [s.re.to_le_bytes(), s.im.to_le_bytes()])
        .flatten()
        .collect()
}

/// Four dibits per byte, first in the high bits; a partial final byte is zero padded.
pub fn pack_dibits(dibits: &[Dibit]) -> Vec<u8> {
    dibits
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, d)| acc | (d.low_value() << (6 - 2 * i)))
        })
        .collect()
}
