//! Provisioning pipeline: packs validated WAV files into a SPIFFS image and
//! flashes it to an ESP32-S3 over serial.
//!
//! Image construction and the flash protocol are left to `mkspiffs` and
//! `esptool`; this crate decides what goes into the image, where it goes, and
//! which port it goes through.
//!
//! # Modules
//!
//! - [`config`]: defaults, `FlashOffset` and `PartitionSize`
//! - [`port`]: VID:PID bridge table and port resolution
//! - [`command`]: typed command descriptors and the `Executor` seam
//! - [`tool`]: external executable lookup
//! - [`plan`]: capacity check and `UploadPlan`
//! - [`scratch`]: temp directory for staging and the image
//! - [`image`]: `mkspiffs` invocation
//! - [`flash`]: `esptool` invocation
//! - [`pipeline`]: stage orchestration

pub mod command;
pub mod config;
pub mod error;
pub mod flash;
pub mod image;
pub mod pipeline;
pub mod plan;
pub mod port;
pub mod scratch;
pub mod tool;

// Top-level re-exports for convenience
pub use command::{CommandOutput, CommandSpec, Executor, SystemExecutor};
pub use config::{FlashOffset, PartitionSize, UploadOptions};
pub use error::UploadError;
pub use image::DeviceImage;
pub use pipeline::{NullReporter, Pipeline, Reporter, RunOutcome, Stage};
pub use plan::{PlanAdvisory, UploadPlan};
pub use port::{PortEnumerator, PortInfo, PortSource, ResolvedPort, SystemPorts};
