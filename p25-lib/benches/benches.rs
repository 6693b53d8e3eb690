use std::f32::consts::TAU;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use num_complex::Complex32;
use rand::Rng;

use p25::{
    bits::BinaryMessage,
    dsp::{Demodulator, DemodulatorConfig, Dibit},
    edac::{encode_18, Bch63_16, Golay, HexbitCode, Integrity, Trellis, BLOCK_BITS},
    framing::{FramerConfig, MessageFramer},
};

fn bench_bch_decode(c: &mut Criterion) {
    let bch = Bch63_16::new();
    // five errors spread over the codeword
    let codeword = bch.encode(0x2935) ^ 0x0400_1000_0400_1001;

    let mut group = c.benchmark_group("bch");
    group.bench_function("correct_nid", |b| {
        b.iter(|| {
            let (integrity, _) = bch.decode_word(codeword);
            assert_eq!(integrity, Integrity::Corrected(5));
        });
    });
    group.finish();
}

fn bench_rs_decode(c: &mut Criterion) {
    let rs = HexbitCode::rs_24_12_13();
    let data: Vec<u8> = (0..12).map(|i| (i * 7 + 3) % 64).collect();
    let mut received = rs.encode(&data);
    received[2] ^= 0x15;
    received[17] ^= 0x3f;

    let mut group = c.benchmark_group("rs");
    group.bench_function("correct_link_control", |b| {
        b.iter(|| {
            let mut word = received.clone();
            assert_eq!(rs.decode(&mut word), Integrity::Corrected(2));
        });
    });
    group.finish();
}

fn bench_golay_decode(c: &mut Criterion) {
    let golay = Golay::new();
    let received = encode_18(0x2d) ^ 0b10_0000_0001_0000_0100;

    let mut group = c.benchmark_group("golay");
    group.bench_function("correct_header_word", |b| {
        b.iter(|| {
            let (integrity, _) = golay.decode_18(received);
            assert_eq!(integrity, Integrity::Corrected(3));
        });
    });
    group.finish();
}

fn bench_trellis_decode(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut block = BinaryMessage::new(BLOCK_BITS);
    for idx in 0..96 {
        block.set(idx, rng.gen());
    }
    let trellis = Trellis::half();
    trellis.encode(&mut block, 0);

    let mut group = c.benchmark_group("trellis");
    group.throughput(Throughput::Elements(1));
    group.bench_function("half_rate_block", |b| {
        b.iter(|| {
            let mut msg = block.clone();
            assert!(trellis.decode(&mut msg, 0).ok());
        });
    });
    group.finish();
}

fn bench_framer(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let dibits: Vec<Dibit> = (0..10_000)
        .map(|_| Dibit::from_value(rng.gen_range(0..4)))
        .collect();

    let mut group = c.benchmark_group("framer");
    group.throughput(Throughput::Elements(dibits.len() as u64));
    group.bench_function("random_dibits", |b| {
        b.iter(|| {
            let mut framer = MessageFramer::new(FramerConfig::default(), Vec::new()).unwrap();
            for dibit in &dibits {
                framer.receive(*dibit).unwrap();
            }
        });
    });
    group.finish();
}

fn bench_demodulate(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut phase = 0.0f32;
    let samples: Vec<Complex32> = (0..1_000)
        .flat_map(|_| {
            phase = (phase + Dibit::from_value(rng.gen_range(0..4)).phase()) % TAU;
            std::iter::repeat(Complex32::from_polar(1.0, phase)).take(10)
        })
        .collect();

    let mut group = c.benchmark_group("demodulator");
    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("samples", |b| {
        b.iter(|| {
            let mut demod = Demodulator::new(&DemodulatorConfig::default()).unwrap();
            samples.iter().filter_map(|s| demod.receive(*s)).count()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_bch_decode,
    bench_rs_decode,
    bench_golay_decode,
    bench_trellis_decode,
    bench_framer,
    bench_demodulate,
);
criterion_main!(benches);
