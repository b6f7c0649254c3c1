//! Rules: the device's playback constraints as a declarative table.
//!
//! Each [`Rule`] inspects one property of an [`AudioCandidate`] and produces
//! either a pass, an [`Advisory`] (reported, never disqualifying) or a
//! [`Rejection`] (excludes the file from the upload).

use core::fmt;

use crate::candidate::{AudioCandidate, SampleEncoding};

/// Largest file the device player will load into RAM: 200 KiB.
pub const MAX_FILE_BYTES: u64 = 204_800;

/// Sample rates the I2S output runs at without resampling artefacts.
pub const RECOMMENDED_SAMPLE_RATES: [u32; 3] = [22_050, 44_100, 48_000];

/// Mono or stereo only.
pub const MAX_CHANNELS: u16 = 2;

/// Bit depths the player's PCM path understands.
pub const SUPPORTED_BIT_DEPTHS: [u16; 2] = [8, 16];

/// SPIFFS object name limit (32 bytes including the terminator).
pub const MAX_NAME_BYTES: usize = 31;

/// Rules in evaluation order.
pub const RULES: [Rule; 6] = [
    Rule::FileSize,
    Rule::SampleRate,
    Rule::Channels,
    Rule::BitDepth,
    Rule::Encoding,
    Rule::FileName,
];

/// A disqualifying finding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// File is larger than [`MAX_FILE_BYTES`].
    #[error("file is {size} bytes, over the {limit} byte per-file limit")]
    SizeLimit {
        /// Actual size in bytes.
        size: u64,
        /// Ceiling in bytes.
        limit: u64,
    },
    /// More channels than the device can mix down.
    #[error("{channels} channels, at most {max} supported")]
    TooManyChannels {
        /// Channel count from the header.
        channels: u16,
        /// Ceiling.
        max: u16,
    },
    /// Bit depth outside [`SUPPORTED_BIT_DEPTHS`].
    #[error("{bits}-bit samples, only 8 or 16-bit supported")]
    UnsupportedBitDepth {
        /// Bits per sample from the header.
        bits: u16,
    },
    /// Float sample data; the player only decodes integer PCM.
    #[error("IEEE float samples, only integer PCM supported")]
    NotPcm,
}

/// Error class of a [`Rejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Per-file size ceiling exceeded.
    SizeLimit,
    /// Channel count, bit depth or encoding not supported.
    Format,
}

impl Rejection {
    /// Which class of error this rejection belongs to.
    #[must_use]
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::SizeLimit { .. } => RejectionKind::SizeLimit,
            Self::TooManyChannels { .. } | Self::UnsupportedBitDepth { .. } | Self::NotPcm => {
                RejectionKind::Format
            }
        }
    }
}

/// A finding that is reported but does not exclude the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Sample rate outside [`RECOMMENDED_SAMPLE_RATES`].
    UncommonSampleRate {
        /// Sample rate from the header.
        hz: u32,
    },
    /// Name longer than the device filesystem keeps.
    LongFileName {
        /// Name length in bytes.
        len: usize,
        /// Limit in bytes.
        max: usize,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UncommonSampleRate { hz } => write!(
                f,
                "{} Hz is not a recommended rate, use 22050, 44100 or 48000 Hz",
                hz
            ),
            Self::LongFileName { len, max } => write!(
                f,
                "file name is {} bytes, the device filesystem keeps at most {}",
                len, max
            ),
        }
    }
}

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Constraint satisfied.
    Pass,
    /// Constraint not met, file still usable.
    Warn(Advisory),
    /// Constraint not met, file excluded.
    Fail(Rejection),
}

/// One device constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Per-file size ceiling.
    FileSize,
    /// Recommended sample rates.
    SampleRate,
    /// Channel ceiling.
    Channels,
    /// Supported bit depths.
    BitDepth,
    /// Integer PCM only.
    Encoding,
    /// Device filesystem name length.
    FileName,
}

impl Rule {
    /// Short label for reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FileSize => "size",
            Self::SampleRate => "sample rate",
            Self::Channels => "channels",
            Self::BitDepth => "bit depth",
            Self::Encoding => "encoding",
            Self::FileName => "file name",
        }
    }

    /// Apply this rule to `c`.
    #[must_use]
    pub fn evaluate(self, c: &AudioCandidate) -> CheckStatus {
        match self {
            Self::FileSize if c.byte_size > MAX_FILE_BYTES => {
                CheckStatus::Fail(Rejection::SizeLimit {
                    size: c.byte_size,
                    limit: MAX_FILE_BYTES,
                })
            }
            Self::SampleRate if !RECOMMENDED_SAMPLE_RATES.contains(&c.sample_rate) => {
                CheckStatus::Warn(Advisory::UncommonSampleRate { hz: c.sample_rate })
            }
            Self::Channels if c.channels > MAX_CHANNELS => {
                CheckStatus::Fail(Rejection::TooManyChannels {
                    channels: c.channels,
                    max: MAX_CHANNELS,
                })
            }
            Self::BitDepth if !SUPPORTED_BIT_DEPTHS.contains(&c.bits_per_sample) => {
                CheckStatus::Fail(Rejection::UnsupportedBitDepth {
                    bits: c.bits_per_sample,
                })
            }
            Self::Encoding if c.encoding != SampleEncoding::Pcm => {
                CheckStatus::Fail(Rejection::NotPcm)
            }
            Self::FileName => {
                let len = c.file_name().len();
                if len > MAX_NAME_BYTES {
                    CheckStatus::Warn(Advisory::LongFileName {
                        len,
                        max: MAX_NAME_BYTES,
                    })
                } else {
                    CheckStatus::Pass
                }
            }
            _ => CheckStatus::Pass,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn compliant() -> AudioCandidate {
        AudioCandidate {
            path: PathBuf::from("wav_files/ring.wav"),
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::Pcm,
            frames: 25_000,
            byte_size: 50_044,
        }
    }

    #[test]
    fn compliant_file_passes_every_rule() {
        let c = compliant();
        for rule in RULES {
            assert_eq!(rule.evaluate(&c), CheckStatus::Pass, "rule {}", rule.label());
        }
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let mut c = compliant();
        c.byte_size = MAX_FILE_BYTES;
        assert_eq!(Rule::FileSize.evaluate(&c), CheckStatus::Pass);
        c.byte_size = MAX_FILE_BYTES + 1;
        assert_eq!(
            Rule::FileSize.evaluate(&c),
            CheckStatus::Fail(Rejection::SizeLimit {
                size: 204_801,
                limit: 204_800
            })
        );
    }

    #[test]
    fn uncommon_rate_warns() {
        let mut c = compliant();
        c.sample_rate = 16_000;
        assert_eq!(
            Rule::SampleRate.evaluate(&c),
            CheckStatus::Warn(Advisory::UncommonSampleRate { hz: 16_000 })
        );
    }

    #[test]
    fn stereo_is_allowed_surround_is_not() {
        let mut c = compliant();
        c.channels = 2;
        assert_eq!(Rule::Channels.evaluate(&c), CheckStatus::Pass);
        c.channels = 6;
        assert!(matches!(
            Rule::Channels.evaluate(&c),
            CheckStatus::Fail(Rejection::TooManyChannels { channels: 6, max: 2 })
        ));
    }

    #[test]
    fn eight_bit_passes_twenty_four_fails() {
        let mut c = compliant();
        c.bits_per_sample = 8;
        assert_eq!(Rule::BitDepth.evaluate(&c), CheckStatus::Pass);
        c.bits_per_sample = 24;
        assert_eq!(
            Rule::BitDepth.evaluate(&c),
            CheckStatus::Fail(Rejection::UnsupportedBitDepth { bits: 24 })
        );
    }

    #[test]
    fn float_encoding_is_rejected() {
        let mut c = compliant();
        c.encoding = SampleEncoding::Float;
        assert_eq!(
            Rule::Encoding.evaluate(&c),
            CheckStatus::Fail(Rejection::NotPcm)
        );
    }

    #[test]
    fn long_name_warns() {
        let mut c = compliant();
        c.path = PathBuf::from("wav_files/a_really_long_doorbell_chime_name.wav");
        assert!(matches!(
            Rule::FileName.evaluate(&c),
            CheckStatus::Warn(Advisory::LongFileName { max: 31, .. })
        ));
    }

    #[test]
    fn rejection_kinds() {
        assert_eq!(
            Rejection::SizeLimit { size: 1, limit: 0 }.kind(),
            RejectionKind::SizeLimit
        );
        assert_eq!(Rejection::NotPcm.kind(), RejectionKind::Format);
        assert_eq!(
            Rejection::UnsupportedBitDepth { bits: 32 }.kind(),
            RejectionKind::Format
        );
    }

    #[test]
    fn advisory_display_names_the_rate() {
        let msg = Advisory::UncommonSampleRate { hz: 8_000 }.to_string();
        assert!(msg.contains("8000 Hz"));
    }
}
