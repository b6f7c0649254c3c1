//! AudioCandidate: header metadata of one WAV file on disk.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

/// Error returned when a file cannot be inspected as a WAV container.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file's size could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File being inspected.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The RIFF/WAVE header is missing or malformed.
    #[error("not a readable WAV file ({}): {source}", path.display())]
    Malformed {
        /// File being inspected.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: hound::Error,
    },
}

/// Sample encoding declared in the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Integer PCM (`audio_format == 1`, or the extensible PCM sub-format).
    Pcm,
    /// IEEE 754 float samples.
    Float,
}

impl From<SampleFormat> for SampleEncoding {
    fn from(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Int => Self::Pcm,
            SampleFormat::Float => Self::Float,
        }
    }
}

/// One WAV file found in the input folder, with the header fields the
/// validator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCandidate {
    /// Location on the host filesystem.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Integer PCM or float.
    pub encoding: SampleEncoding,
    /// Samples per channel.
    pub frames: u32,
    /// Size of the whole file in bytes, headers included.
    pub byte_size: u64,
}

impl AudioCandidate {
    /// Read the header of `path` and stat its size.
    ///
    /// Only the header is parsed; sample data is never decoded. Bit depths
    /// that are not a multiple of 8 (12-bit, 20-bit) are refused by the
    /// header reader itself, so they surface here as [`ParseError::Malformed`]
    /// rather than as a bit-depth rejection.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the file cannot be opened or is not a
    /// well-formed WAV container.
    pub fn inspect(path: &Path) -> Result<Self, ParseError> {
        let byte_size = fs::metadata(path)
            .map_err(|source| ParseError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let reader = WavReader::open(path).map_err(|source| ParseError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = reader.spec();

        Ok(Self {
            path: path.to_path_buf(),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            encoding: spec.sample_format.into(),
            frames: reader.duration(),
            byte_size,
        })
    }

    /// Playback length in seconds (`frames / sample_rate`).
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.frames) / f64::from(self.sample_rate)
    }

    /// Final path component, as it will be named on the device.
    #[must_use]
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
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
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(path: &Path, spec: WavSpec, frames: u32) {
        let mut w = WavWriter::create(path, spec).unwrap();
        for _ in 0..frames * u32::from(spec.channels) {
            match (spec.sample_format, spec.bits_per_sample) {
                (SampleFormat::Float, _) => w.write_sample(0.0f32).unwrap(),
                (SampleFormat::Int, 8) => w.write_sample(0i8).unwrap(),
                (SampleFormat::Int, 16) => w.write_sample(0i16).unwrap(),
                (SampleFormat::Int, _) => w.write_sample(0i32).unwrap(),
            }
        }
        w.finalize().unwrap();
    }

    #[test]
    fn inspect_reads_header_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chime.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, 1_000);

        let c = AudioCandidate::inspect(&path).unwrap();
        assert_eq!(c.sample_rate, 22_050);
        assert_eq!(c.channels, 2);
        assert_eq!(c.bits_per_sample, 16);
        assert_eq!(c.encoding, SampleEncoding::Pcm);
        assert_eq!(c.frames, 1_000);
        assert_eq!(c.byte_size, fs::metadata(&path).unwrap().len());
        // 1000 frames * 2 channels * 2 bytes, plus the header
        assert!(c.byte_size > 4_000);
        assert_eq!(c.file_name(), "chime.wav");
    }

    #[test]
    fn inspect_reports_float_encoding() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        write_wav(&path, spec, 10);

        let c = AudioCandidate::inspect(&path).unwrap();
        assert_eq!(c.encoding, SampleEncoding::Float);
        assert_eq!(c.bits_per_sample, 32);
    }

    #[test]
    fn inspect_rejects_non_riff_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.wav");
        fs::write(&path, b"ID3\x04not a wav at all").unwrap();

        let err = AudioCandidate::inspect(&path).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn inspect_refuses_12_bit_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("odd_depth.wav");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&2u16.to_le_bytes()); // channels
        bytes.extend_from_slice(&44_100u32.to_le_bytes());
        bytes.extend_from_slice(&(44_100u32 * 4).to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes()); // block align
        bytes.extend_from_slice(&12u16.to_le_bytes()); // bits per sample
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        fs::write(&path, bytes).unwrap();

        let err = AudioCandidate::inspect(&path).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn inspect_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = AudioCandidate::inspect(&tmp.path().join("gone.wav")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn duration_is_frames_over_rate() {
        let c = AudioCandidate {
            path: PathBuf::from("ring.wav"),
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::Pcm,
            frames: 88_200,
            byte_size: 176_444,
        };
        assert!((c.duration_secs() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_of_zero_rate_is_zero() {
        let c = AudioCandidate {
            path: PathBuf::from("odd.wav"),
            sample_rate: 0,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::Pcm,
            frames: 10,
            byte_size: 64,
        };
        assert_eq!(c.duration_secs(), 0.0);
    }
}
