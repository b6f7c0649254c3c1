//! WAV discovery and validation against the device's playback constraints.
//!
//! # Modules
//!
//! - [`discovery`]: top-level `*.wav` enumeration of an input folder
//! - [`candidate`]: `AudioCandidate` header inspection
//! - [`rules`]: the per-file rule table and its findings
//! - [`verdict`]: running every rule and collecting the outcome

pub mod candidate;
pub mod discovery;
pub mod rules;
pub mod verdict;

// Top-level re-exports for convenience
pub use candidate::{AudioCandidate, ParseError, SampleEncoding};
pub use discovery::{discover, DiscoveryError};
pub use rules::{Advisory, CheckStatus, Rejection, RejectionKind, Rule, RULES};
pub use verdict::{check_file, validate, CheckResult, FileReport, Verdict};
