//! Property tests for the partition capacity check and offset parsing.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects
)]

use std::path::PathBuf;

use audio_check::{AudioCandidate, SampleEncoding};
use proptest::prelude::*;
use provision::config::MIB;
use provision::plan::{ensure_capacity, total_size};
use provision::{FlashOffset, PartitionSize, UploadError};

fn candidate(byte_size: u64) -> AudioCandidate {
    AudioCandidate {
        path: PathBuf::from("clip.wav"),
        sample_rate: 44_100,
        channels: 1,
        bits_per_sample: 16,
        encoding: SampleEncoding::Pcm,
        frames: 0,
        byte_size,
    }
}

proptest! {
    /// The check fails exactly when the total exceeds the image size.
    #[test]
    fn capacity_check_matches_image_size(
        sizes in prop::collection::vec(0u64..=204_800, 0..40),
        mib in PartitionSize::MIN_MIB..=PartitionSize::MAX_MIB,
    ) {
        let files: Vec<_> = sizes.iter().copied().map(candidate).collect();
        let partition = PartitionSize::new(mib).unwrap();
        let total = total_size(&files);

        prop_assert_eq!(total, sizes.iter().sum::<u64>());
        match ensure_capacity(total, partition) {
            Ok(()) => prop_assert!(total <= partition.image_bytes()),
            Err(UploadError::SizeLimit { total: t, capacity }) => {
                prop_assert_eq!(t, total);
                prop_assert_eq!(capacity, partition.image_bytes());
                prop_assert!(t > capacity);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Sizes outside the known table are exactly MiB * 2^20.
    #[test]
    fn unknown_layouts_use_whole_mebibytes(mib in PartitionSize::MIN_MIB..=PartitionSize::MAX_MIB) {
        let partition = PartitionSize::new(mib).unwrap();
        if !partition.is_known_layout() {
            prop_assert_eq!(partition.image_bytes(), u64::from(mib) * MIB);
        }
    }

    /// Hex and decimal spellings of the same address parse identically.
    #[test]
    fn offset_hex_and_decimal_agree(addr in any::<u32>()) {
        let hex: FlashOffset = format!("{addr:#x}").parse().unwrap();
        let upper: FlashOffset = format!("0X{addr:X}").parse().unwrap();
        let dec: FlashOffset = addr.to_string().parse().unwrap();
        prop_assert_eq!(hex, dec);
        prop_assert_eq!(upper, dec);
        prop_assert_eq!(hex.get(), addr);
    }
}
