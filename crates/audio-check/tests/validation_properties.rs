//! Property-based tests for the device rule table.
//! Verifies the accept/reject invariants hold for ALL header values, not just
//! fixed examples.

// Test files legitimately use arithmetic for verification; allow at file level.
#![allow(clippy::arithmetic_side_effects)]

use std::path::PathBuf;

use audio_check::rules::{MAX_FILE_BYTES, RECOMMENDED_SAMPLE_RATES};
use audio_check::{validate, AudioCandidate, Rejection, RejectionKind, SampleEncoding};
use proptest::prelude::*;

fn candidate(byte_size: u64, rate: u32, channels: u16, bits: u16) -> AudioCandidate {
    AudioCandidate {
        path: PathBuf::from("wav_files/tone.wav"),
        sample_rate: rate,
        channels,
        bits_per_sample: bits,
        encoding: SampleEncoding::Pcm,
        frames: 4_410,
        byte_size,
    }
}

fn any_bits() -> impl Strategy<Value = u16> {
    prop_oneof![Just(8u16), Just(16), Just(24), Just(32), 1u16..=64]
}

proptest! {
    /// Oversize files always fail with a size error, whatever else is true.
    #[test]
    fn oversize_always_fails_with_size_error(
        size in (MAX_FILE_BYTES + 1)..=u64::from(u32::MAX),
        rate in 1u32..=384_000,
        channels in 1u16..=8,
        bits in any_bits(),
    ) {
        let v = validate(&candidate(size, rate, channels, bits));
        prop_assert!(!v.passed());
        prop_assert!(v.errors().any(|e| e.kind() == RejectionKind::SizeLimit));
    }

    /// More than two channels always fails, regardless of size or rate.
    #[test]
    fn surround_always_fails(
        size in 0u64..=MAX_FILE_BYTES * 4,
        rate in 1u32..=384_000,
        channels in 3u16..=32,
    ) {
        let v = validate(&candidate(size, rate, channels, 16));
        prop_assert!(!v.passed());
        let has_channel_error = v
            .errors()
            .any(|e| matches!(e, Rejection::TooManyChannels { .. }));
        prop_assert!(has_channel_error);
    }

    /// Any bit depth other than 8 or 16 fails.
    #[test]
    fn unsupported_bit_depth_always_fails(bits in 0u16..=64) {
        prop_assume!(bits != 8 && bits != 16);
        let v = validate(&candidate(1_000, 44_100, 1, bits));
        prop_assert!(!v.passed());
        prop_assert_eq!(
            v.errors().cloned().collect::<Vec<_>>(),
            vec![Rejection::UnsupportedBitDepth { bits }]
        );
    }

    /// An uncommon rate on an otherwise compliant file passes with exactly one warning.
    #[test]
    fn uncommon_rate_passes_with_one_warning(
        rate in 1u32..=384_000,
        size in 0u64..=MAX_FILE_BYTES,
        channels in 1u16..=2,
        bits in prop_oneof![Just(8u16), Just(16)],
    ) {
        prop_assume!(!RECOMMENDED_SAMPLE_RATES.contains(&rate));
        let v = validate(&candidate(size, rate, channels, bits));
        prop_assert!(v.passed());
        prop_assert_eq!(v.warnings().count(), 1);
    }

    /// Validation is a pure function of the header.
    #[test]
    fn validation_is_idempotent(
        size in 0u64..=MAX_FILE_BYTES * 2,
        rate in 1u32..=384_000,
        channels in 1u16..=8,
        bits in any_bits(),
    ) {
        let c = candidate(size, rate, channels, bits);
        prop_assert_eq!(validate(&c), validate(&c));
    }
}
