use std::{
    io::{BufReader, ErrorKind, Read},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{bounded, Receiver, Sender};
use num_complex::Complex32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FramerConfig, FramerStats, MessageFramer};
use crate::{
    dsp::{Demodulator, DemodulatorConfig, Dibit},
    message::Message,
    Result,
};

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Layout of the bytes handed to [decode].
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputFormat {
    /// Interleaved little-endian `f32` I/Q baseband samples.
    #[display("iq")]
    Iq,
    /// Dibits packed four per byte, first dibit in the high bits.
    #[display("dibits")]
    Dibits,
}

/// Iterator over the messages decoded by a background [decode] thread.
pub struct Messages {
    messages: Receiver<Message>,
    handle: Option<JoinHandle<Result<FramerStats>>>,
}

impl Iterator for Messages {
    type Item = Message;

    fn next(&mut self) -> Option<Self::Item> {
        self.messages.recv().ok()
    }
}

impl Messages {
    /// Drain any remaining messages and wait for the decode thread.
    ///
    /// # Errors
    /// Any error reading the input.
    ///
    /// # Panics
    /// If the decode thread panicked.
    pub fn finish(mut self) -> Result<FramerStats> {
        for _ in self.by_ref() {}
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(zult) => zult,
                Err(err) => std::panic::resume_unwind(err),
            },
            None => Ok(FramerStats::default()),
        }
    }
}

fn decode_samples<R: Read>(
    reader: R,
    mut demodulator: Demodulator,
    framer: &mut MessageFramer<Sender<Message>>,
) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = [0u8; 8];
    loop {
        match reader.read_exact(&mut buf) {
            Ok(()) => (),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let sample = Complex32::new(
            f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        );
        if let Some(symbol) = demodulator.receive_symbol(sample) {
            framer.receive_symbol(symbol)?;
        }
    }
}

fn decode_dibits<R: Read>(reader: R, framer: &mut MessageFramer<Sender<Message>>) -> Result<()> {
    for byte in BufReader::new(reader).bytes() {
        let byte = byte?;
        for shift in [6, 4, 2, 0] {
            framer.receive(Dibit::from_value(byte >> shift))?;
        }
    }
    Ok(())
}

/// Decode P25 messages from `reader` on a background thread.
///
/// Samples are only run through a [Demodulator] for [InputFormat::Iq]. Message
/// delivery is bounded, so the decode thread stalls while the returned iterator is not
/// consumed.
///
/// # Errors
/// [crate::Error::InvalidConfig] for an invalid configuration, or
/// [crate::Error::Io] if the decode thread cannot be started.
pub fn decode<R>(
    reader: R,
    format: InputFormat,
    config: FramerConfig,
    demodulator: DemodulatorConfig,
) -> Result<Messages>
where
    R: Read + Send + 'static,
{
    let demodulator = Demodulator::new(&demodulator)?;
    let (tx, rx) = bounded(DEFAULT_BUFFER_SIZE);
    let mut framer = MessageFramer::new(config, tx)?;

    let handle = thread::Builder::new()
        .name("p25::decode".into())
        .spawn(move || -> Result<FramerStats> {
            match format {
                InputFormat::Iq => decode_samples(reader, demodulator, &mut framer)?,
                InputFormat::Dibits => decode_dibits(reader, &mut framer)?,
            }
            let stats = framer.stats();
            debug!(?stats, "decode thread exit");
            Ok(stats)
        })?;

    Ok(Messages {
        messages: rx,
        handle: Some(handle),
    })
}
