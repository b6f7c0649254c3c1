//! Upload configuration and device constants
//!
//! Every default the CLI exposes lives here, alongside the newtypes that
//! validate user-supplied offsets and partition sizes.

use core::fmt;
use core::str::FromStr;
use std::path::PathBuf;

/// Folder scanned when `--wav-folder` is not given.
pub const DEFAULT_WAV_FOLDER: &str = "wav_files";

/// SPIFFS partition offset in the stock partition table.
pub const DEFAULT_OFFSET: FlashOffset = FlashOffset(0x41_0000);

/// SPIFFS partition size in the stock partition table, in MiB.
pub const DEFAULT_PARTITION_MIB: u32 = 12;

/// Bytes per MiB.
pub const MIB: u64 = 1_048_576;

/// Flash size of the target ESP32-S3 module.
pub const FLASH_BYTES: u64 = 0x100_0000;

/// Erase granularity of the SPI flash.
pub const SECTOR_BYTES: u32 = 0x1000;

/// Files the firmware mounts (`max_files` in its SPIFFS config).
pub const MAX_DEVICE_FILES: usize = 20;

/// Partition sizes whose exact byte count is known from the partition table.
///
/// The 12 MiB entry is `0xBF0000`: the partition runs from `0x410000` to the
/// 16 MiB end of flash, 64 KiB short of a full 12 MiB.
pub const KNOWN_PARTITIONS: [(u32, u64); 1] = [(12, 0xBF_0000)];

// ── FlashOffset ──────────────────────────────────────────────────────────────

/// Error returned when `--offset` cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid flash offset '{0}': expected hex (0x410000) or decimal")]
pub struct FlashOffsetError(pub String);

/// Byte address in device flash where the image is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FlashOffset(u32);

impl FlashOffset {
    /// Wrap a raw byte address.
    #[must_use]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Return the byte address.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// `true` when the address starts a flash sector.
    #[must_use]
    pub fn is_sector_aligned(self) -> bool {
        self.0.checked_rem(SECTOR_BYTES) == Some(0)
    }
}

impl FromStr for FlashOffset {
    type Err = FlashOffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => t.parse::<u32>(),
        };
        parsed
            .map(Self)
            .map_err(|_| FlashOffsetError(s.to_string()))
    }
}

impl fmt::Display for FlashOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// ── PartitionSize ────────────────────────────────────────────────────────────

/// Error returned when `--size` is outside what the flash can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("partition size {value} MiB is outside {min}..={max} MiB")]
pub struct PartitionSizeError {
    /// The rejected value.
    pub value: u32,
    /// The inclusive minimum.
    pub min: u32,
    /// The inclusive maximum.
    pub max: u32,
}

/// Size of the SPIFFS partition, in whole MiB as the user states it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PartitionSize(u32);

impl PartitionSize {
    /// Smallest partition accepted.
    pub const MIN_MIB: u32 = 1;

    /// Largest partition accepted: the whole flash.
    pub const MAX_MIB: u32 = 16;

    /// Create a `PartitionSize`, rejecting values outside 1–16 MiB.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionSizeError`] if `mib` is out of range.
    pub fn new(mib: u32) -> Result<Self, PartitionSizeError> {
        if (Self::MIN_MIB..=Self::MAX_MIB).contains(&mib) {
            Ok(Self(mib))
        } else {
            Err(PartitionSizeError {
                value: mib,
                min: Self::MIN_MIB,
                max: Self::MAX_MIB,
            })
        }
    }

    /// Size in MiB.
    #[must_use]
    pub fn mib(self) -> u32 {
        self.0
    }

    /// `true` when the byte count comes from [`KNOWN_PARTITIONS`].
    #[must_use]
    pub fn is_known_layout(self) -> bool {
        KNOWN_PARTITIONS.iter().any(|&(mib, _)| mib == self.0)
    }

    /// Image size handed to the image builder, in bytes.
    ///
    /// Known layouts use their exact partition size; anything else is
    /// `mib * 1024 * 1024`.
    #[must_use]
    pub fn image_bytes(self) -> u64 {
        KNOWN_PARTITIONS
            .iter()
            .find(|&&(mib, _)| mib == self.0)
            .map_or_else(|| u64::from(self.0).saturating_mul(MIB), |&(_, bytes)| bytes)
    }
}

impl Default for PartitionSize {
    fn default() -> Self {
        Self(DEFAULT_PARTITION_MIB)
    }
}

impl fmt::Display for PartitionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PartitionSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mib = s
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid partition size '{}': {}", s, e))?;
        Self::new(mib).map_err(|e| e.to_string())
    }
}

// ── UploadOptions ────────────────────────────────────────────────────────────

/// Everything one run needs to know, as resolved from the command line.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Folder scanned for `*.wav`.
    pub wav_folder: PathBuf,
    /// Serial port; autodetected when `None`.
    pub port: Option<String>,
    /// Flash address of the SPIFFS partition.
    pub offset: FlashOffset,
    /// SPIFFS partition size.
    pub partition: PartitionSize,
    /// Stop after the plan is built: no image, no flashing.
    pub check_only: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            wav_folder: PathBuf::from(DEFAULT_WAV_FOLDER),
            port: None,
            offset: DEFAULT_OFFSET,
            partition: PartitionSize::default(),
            check_only: false,
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

    #[test]
    fn offset_parses_hex_and_decimal() {
        assert_eq!("0x410000".parse::<FlashOffset>().unwrap().get(), 0x41_0000);
        assert_eq!("0X9000".parse::<FlashOffset>().unwrap().get(), 0x9000);
        assert_eq!("4259840".parse::<FlashOffset>().unwrap().get(), 0x41_0000);
    }

    #[test]
    fn offset_rejects_garbage() {
        assert!("0xZZ".parse::<FlashOffset>().is_err());
        assert!("".parse::<FlashOffset>().is_err());
        assert!("-1".parse::<FlashOffset>().is_err());
    }

    #[test]
    fn offset_displays_as_hex() {
        assert_eq!(DEFAULT_OFFSET.to_string(), "0x410000");
    }

    #[test]
    fn offset_alignment() {
        assert!(DEFAULT_OFFSET.is_sector_aligned());
        assert!(!FlashOffset::new(0x41_0100).is_sector_aligned());
    }

    #[test]
    fn twelve_mib_uses_exact_partition_size() {
        let p = PartitionSize::new(12).unwrap();
        assert!(p.is_known_layout());
        assert_eq!(p.image_bytes(), 12_517_376);
    }

    #[test]
    fn other_sizes_use_mib_formula() {
        let p = PartitionSize::new(4).unwrap();
        assert!(!p.is_known_layout());
        assert_eq!(p.image_bytes(), 4 * 1024 * 1024);
    }

    #[test]
    fn partition_size_range() {
        assert!(PartitionSize::new(0).is_err());
        assert!(PartitionSize::new(16).is_ok());
        assert_eq!(
            PartitionSize::new(32),
            Err(PartitionSizeError {
                value: 32,
                min: 1,
                max: 16
            })
        );
        assert!("abc".parse::<PartitionSize>().is_err());
        assert_eq!("12".parse::<PartitionSize>().unwrap().mib(), 12);
    }

    #[test]
    fn default_options_match_stock_layout() {
        let o = UploadOptions::default();
        assert_eq!(o.wav_folder, PathBuf::from("wav_files"));
        assert_eq!(o.offset, DEFAULT_OFFSET);
        assert_eq!(o.partition.mib(), 12);
        assert!(o.port.is_none());
        assert!(!o.check_only);
    }
}
