// Binary crate: no public API to document.
#![allow(missing_docs)]

mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use provision::config::DEFAULT_WAV_FOLDER;
use provision::{
    FlashOffset, PartitionSize, Pipeline, RunOutcome, SystemExecutor, SystemPorts, UploadOptions,
};
use tracing_subscriber::EnvFilter;

use report::ConsoleReporter;

#[derive(Parser, Debug)]
#[command(name = "wav-upload")]
#[command(about = "Validate WAV clips and flash them to an ESP32-S3 SPIFFS partition", long_about = None)]
#[command(version)]
struct Cli {
    /// Serial port of the device (e.g. COM3, /dev/ttyUSB0). Auto-detected when omitted.
    #[arg(short, long)]
    port: Option<String>,

    /// Folder holding the WAV files to upload
    #[arg(short, long, default_value = DEFAULT_WAV_FOLDER)]
    wav_folder: PathBuf,

    /// Flash address of the SPIFFS partition, hex (0x410000) or decimal
    #[arg(short, long, default_value = "0x410000")]
    offset: FlashOffset,

    /// SPIFFS partition size in MiB
    #[arg(short, long, default_value_t = PartitionSize::default())]
    size: PartitionSize,

    /// Validate and plan only; do not build or flash an image
    #[arg(long)]
    check_only: bool,

    /// Show debug logs on stderr (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> UploadOptions {
        UploadOptions {
            wav_folder: self.wav_folder.clone(),
            port: self.port.clone(),
            offset: self.offset,
            partition: self.size,
            check_only: self.check_only,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        folder = %cli.wav_folder.display(),
        "starting"
    );

    report::banner();

    let pipeline = Pipeline::new(SystemExecutor, SystemPorts);
    let mut reporter = ConsoleReporter::default();
    match pipeline.run(&cli.options(), &mut reporter) {
        Ok(RunOutcome::Checked(plan)) => {
            report::checked(&plan);
            Ok(())
        }
        Ok(RunOutcome::Uploaded { plan, .. }) => {
            report::uploaded(&plan);
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Upload aborted".red().bold());
            for line in report::remedy(&e) {
                eprintln!("   {}", line.dimmed());
            }
            eprintln!();
            Err(e.into())
        }
    }
}
