//! UploadPlan: what will be written, where, and through which port.

use core::fmt;

use audio_check::AudioCandidate;

use crate::config::{FlashOffset, PartitionSize, FLASH_BYTES, MAX_DEVICE_FILES};
use crate::error::UploadError;
use crate::port::ResolvedPort;

/// Sum of the accepted files' sizes in bytes.
#[must_use]
pub fn total_size(files: &[AudioCandidate]) -> u64 {
    files
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(c.byte_size))
}

/// Check that `total` bytes fit the partition.
///
/// # Errors
///
/// Returns [`UploadError::SizeLimit`] if `total` exceeds
/// [`PartitionSize::image_bytes`].
pub fn ensure_capacity(total: u64, partition: PartitionSize) -> Result<(), UploadError> {
    let capacity = partition.image_bytes();
    if total > capacity {
        return Err(UploadError::SizeLimit { total, capacity });
    }
    Ok(())
}

/// Non-fatal observations about a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAdvisory {
    /// More files than the firmware mounts.
    TooManyFiles {
        /// Accepted file count.
        count: usize,
        /// Firmware limit.
        max: usize,
    },
    /// Partition size not in the known partition table; derived as `MiB * 2^20`.
    UnverifiedPartitionSize {
        /// Size as given.
        mib: u32,
    },
    /// Offset not on a flash sector boundary.
    UnalignedOffset(FlashOffset),
    /// Image would run past the end of flash.
    PastEndOfFlash {
        /// First byte after the image.
        end: u64,
    },
}

impl fmt::Display for PlanAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyFiles { count, max } => write!(
                f,
                "{} files accepted, the firmware mounts at most {}",
                count, max
            ),
            Self::UnverifiedPartitionSize { mib } => write!(
                f,
                "{} MiB is not a known partition layout, image size assumed to be {} MiB exactly; check the partition table",
                mib, mib
            ),
            Self::UnalignedOffset(offset) => write!(
                f,
                "offset {} is not aligned to a 4 KiB flash sector",
                offset
            ),
            Self::PastEndOfFlash { end } => write!(
                f,
                "image would end at {:#x}, past the {:#x} byte flash",
                end, FLASH_BYTES
            ),
        }
    }
}

/// Everything image assembly and transfer need.
///
/// Constructed only after [`ensure_capacity`] has passed.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    /// Accepted files, in discovery order.
    pub files: Vec<AudioCandidate>,
    /// Sum of their sizes.
    pub total_bytes: u64,
    /// Target partition.
    pub partition: PartitionSize,
    /// Port the flasher uses.
    pub port: ResolvedPort,
    /// Flash address of the partition.
    pub offset: FlashOffset,
}

impl UploadPlan {
    /// Bytes left in the partition after the files (filesystem metadata
    /// still has to fit in this).
    #[must_use]
    pub fn headroom(&self) -> u64 {
        self.partition.image_bytes().saturating_sub(self.total_bytes)
    }

    /// Observations worth showing before flashing.
    #[must_use]
    pub fn advisories(&self) -> Vec<PlanAdvisory> {
        let mut out = Vec::new();
        if self.files.len() > MAX_DEVICE_FILES {
            out.push(PlanAdvisory::TooManyFiles {
                count: self.files.len(),
                max: MAX_DEVICE_FILES,
            });
        }
        if !self.partition.is_known_layout() {
            out.push(PlanAdvisory::UnverifiedPartitionSize {
                mib: self.partition.mib(),
            });
        }
        if !self.offset.is_sector_aligned() {
            out.push(PlanAdvisory::UnalignedOffset(self.offset));
        }
        let end = u64::from(self.offset.get()).saturating_add(self.partition.image_bytes());
        if end > FLASH_BYTES {
            out.push(PlanAdvisory::PastEndOfFlash { end });
        }
        out
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
    use crate::config::DEFAULT_OFFSET;
    use crate::port::PortSource;
    use audio_check::SampleEncoding;
    use std::path::PathBuf;

    fn file(name: &str, byte_size: u64) -> AudioCandidate {
        AudioCandidate {
            path: PathBuf::from(name),
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::Pcm,
            frames: 0,
            byte_size,
        }
    }

    fn plan(files: Vec<AudioCandidate>, mib: u32, offset: FlashOffset) -> UploadPlan {
        UploadPlan {
            total_bytes: total_size(&files),
            files,
            partition: PartitionSize::new(mib).unwrap(),
            port: ResolvedPort {
                name: "/dev/ttyUSB0".into(),
                source: PortSource::Explicit,
            },
            offset,
        }
    }

    #[test]
    fn total_is_sum_of_sizes() {
        assert_eq!(total_size(&[file("a.wav", 50_044), file("b.wav", 1_000)]), 51_044);
        assert_eq!(total_size(&[]), 0);
    }

    #[test]
    fn capacity_boundary() {
        let p = PartitionSize::new(1).unwrap();
        assert!(ensure_capacity(1 << 20, p).is_ok());
        assert!(matches!(
            ensure_capacity((1 << 20) + 1, p),
            Err(UploadError::SizeLimit {
                total: 1_048_577,
                capacity: 1_048_576
            })
        ));
    }

    #[test]
    fn twelve_mib_capacity_is_the_exact_partition() {
        let p = PartitionSize::new(12).unwrap();
        assert!(ensure_capacity(12_517_376, p).is_ok());
        // fits in 12 MiB but not in the real 0xBF0000 partition
        assert!(ensure_capacity(12 * 1024 * 1024, p).is_err());
    }

    #[test]
    fn stock_layout_has_no_advisories() {
        let p = plan(vec![file("ring.wav", 50_044)], 12, DEFAULT_OFFSET);
        assert!(p.advisories().is_empty());
        assert_eq!(p.headroom(), 12_517_376 - 50_044);
    }

    #[test]
    fn too_many_files_is_flagged() {
        let files = (0..21).map(|i| file(&format!("{}.wav", i), 100)).collect();
        let p = plan(files, 12, DEFAULT_OFFSET);
        assert_eq!(
            p.advisories(),
            vec![PlanAdvisory::TooManyFiles { count: 21, max: 20 }]
        );
    }

    #[test]
    fn custom_size_past_flash_end_is_flagged() {
        let p = plan(vec![file("a.wav", 10)], 16, FlashOffset::new(0x41_0100));
        let adv = p.advisories();
        assert!(adv.contains(&PlanAdvisory::UnverifiedPartitionSize { mib: 16 }));
        assert!(adv.contains(&PlanAdvisory::UnalignedOffset(FlashOffset::new(0x41_0100))));
        assert!(adv
            .iter()
            .any(|a| matches!(a, PlanAdvisory::PastEndOfFlash { .. })));
    }
}
