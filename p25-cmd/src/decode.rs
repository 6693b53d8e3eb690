use std::{
    fs::File,
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use p25::{
    dsp::DemodulatorConfig,
    framing::{self, FramerConfig, FramerStats, InputFormat},
    message::Message,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub enum Format {
    Iq,
    Dibits,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Iq, Self::Dibits]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Iq => Some(clap::builder::PossibleValue::new("iq")),
            Self::Dibits => Some(clap::builder::PossibleValue::new("dibits")),
        }
    }
}

impl From<Format> for InputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Iq => InputFormat::Iq,
            Format::Dibits => InputFormat::Dibits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Summary<'a> {
    input: &'a Path,
    stats: FramerStats,
}

fn write_message(message: &Message, json: bool) -> Result<()> {
    let mut out = stdout().lock();
    if json {
        serde_json::to_writer(&mut out, message).context("serializing message")?;
        writeln!(out).context("writing to stdout")
    } else {
        writeln!(out, "{message}").context("writing to stdout")
    }
}

fn decode_one(
    input: &Path,
    format: Format,
    config: FramerConfig,
    demodulator: DemodulatorConfig,
    json: bool,
) -> Result<FramerStats> {
    let src = File::open(input).with_context(|| format!("opening input {input:?}"))?;
    let mut messages = framing::decode(src, format.into(), config, demodulator)
        .with_context(|| format!("starting decode of {input:?}"))?;

    for message in messages.by_ref() {
        if !message.is_valid() {
            debug!(nac = message.nac(), duid = %message.duid(), "integrity check failed");
        }
        write_message(&message, json)?;
    }
    let stats = messages
        .finish()
        .with_context(|| format!("decoding {input:?}"))?;

    if stats.syncs == 0 {
        warn!("no frame sync found in {input:?}; check --format and --inverted");
    }
    if json {
        let summary = Summary { input, stats };
        let mut out = stdout().lock();
        serde_json::to_writer(&mut out, &summary).context("serializing stats")?;
        writeln!(out).context("writing to stdout")?;
    }
    Ok(stats)
}

/// Decode every input, in parallel, writing messages to stdout as they arrive.
///
/// Lines from different inputs may interleave.
pub fn decode(
    inputs: &[PathBuf],
    format: Format,
    config: FramerConfig,
    demodulator: DemodulatorConfig,
    json: bool,
) -> Result<()> {
    inputs.par_iter().try_for_each(|input| -> Result<()> {
        let stats = decode_one(input, format, config.clone(), demodulator.clone(), json)?;
        info!(
            bits = stats.bits,
            syncs = stats.syncs,
            dropped = stats.dropped_syncs,
            nid_failures = stats.nid_failures,
            unknown_duids = stats.unknown_duids,
            fec_failures = stats.fec_failures,
            dispatched = stats.dispatched,
            "finished {input:?}"
        );
        Ok(())
    })
}
