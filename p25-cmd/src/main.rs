mod decode;

use std::{io::stderr, path::PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use p25::{dsp::DemodulatorConfig, framing::FramerConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode P25 Phase 1 messages from baseband or dibit files.
    ///
    /// Each decoded message is written to stdout as a single line. Framing statistics
    /// for each input are logged once it has been fully read.
    Decode {
        /// Input file layout.
        ///
        /// iq expects interleaved little-endian f32 I/Q samples, dibits expects dibits
        /// packed four per byte with the first dibit in the high bits.
        #[arg(short, long, default_value = "iq")]
        format: decode::Format,

        /// Apply the inverted dibit table, for receivers with inverted baseband.
        #[arg(short, long, action)]
        inverted: bool,

        /// Number of bit errors tolerated in the 48 bit frame sync.
        #[arg(short, long, default_value_t = 0, value_name = "bits")]
        sync_tolerance: u32,

        /// Baseband sample rate in Hz, for iq inputs.
        #[arg(short = 'r', long, default_value_t = 48_000.0, value_name = "hz")]
        sample_rate: f32,

        /// Write messages as JSON lines.
        #[arg(long, action)]
        json: bool,

        /// Input files.
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("P25_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Decode {
            format,
            inverted,
            sync_tolerance,
            sample_rate,
            json,
            inputs,
        } => {
            if inputs.is_empty() {
                bail!("no inputs given");
            }
            if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
                bail!("{missing:?} does not exist");
            }
            let config = FramerConfig::builder()
                .inverted(*inverted)
                .sync_tolerance(*sync_tolerance)
                .build();
            let demodulator = DemodulatorConfig::builder()
                .sample_rate(*sample_rate)
                .build();
            decode::decode(inputs, *format, config, demodulator, *json)
        }
    }
}
