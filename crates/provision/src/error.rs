//! Stage-level errors. Any of these aborts the run.

use std::io;
use std::path::PathBuf;

use audio_check::DiscoveryError;

/// Error that stops a provisioning run.
///
/// Per-file validation problems are not errors at this level: they are
/// reported through the verdicts and only become [`UploadError::NoValidFiles`]
/// when nothing survives.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The input folder could not be listed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// The input folder holds no `*.wav` files.
    #[error("no WAV files found in {}", .0.display())]
    NoWavFiles(PathBuf),
    /// Every discovered file was rejected or unreadable.
    #[error("no valid WAV files to upload")]
    NoValidFiles,
    /// Accepted files do not fit the partition.
    #[error("accepted files total {total} bytes, over the {capacity} byte SPIFFS partition")]
    SizeLimit {
        /// Sum of accepted file sizes.
        total: u64,
        /// Partition capacity.
        capacity: u64,
    },
    /// No serial port given and none recognised.
    #[error("no known USB serial bridge found, specify the port with --port (e.g. COM3 or /dev/ttyUSB0)")]
    PortNotFound,
    /// A required executable is not on the search path.
    #[error("{tool} not found on PATH; {hint}")]
    ToolNotFound {
        /// Executable name.
        tool: &'static str,
        /// Where to get it.
        hint: &'static str,
    },
    /// An executable was found but could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Executable path.
        tool: String,
        /// OS error.
        #[source]
        source: io::Error,
    },
    /// The image builder exited unsuccessfully.
    #[error("SPIFFS image build failed ({}): {stderr}", exit_label(.code))]
    ImageBuild {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Builder diagnostics, verbatim.
        stderr: String,
    },
    /// The flasher exited unsuccessfully.
    #[error("flashing failed ({})\nstderr: {stderr}\nstdout: {stdout}", exit_label(.code))]
    Flash {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Flasher standard output.
        stdout: String,
        /// Flasher standard error.
        stderr: String,
    },
    /// The scratch directory for staging and the image could not be used.
    #[error("scratch directory: {0}")]
    Scratch(#[source] io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}
