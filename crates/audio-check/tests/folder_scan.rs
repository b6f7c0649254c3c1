//! Discovery + validation over real WAV files written with hound.
//!
//! No mocks. Uses tempfiles.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use std::fs;
use std::path::Path;

use audio_check::{check_file, discover, ParseError, RejectionKind};
use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;

/// Write a silent 16-bit mono 44.1 kHz file of `frames` samples.
fn mono_16bit(path: &Path, frames: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut w = WavWriter::create(path, spec).expect("create wav");
    for _ in 0..frames {
        w.write_sample(0i16).expect("write sample");
    }
    w.finalize().expect("finalize wav");
}

#[test]
fn small_file_accepted_large_file_rejected() {
    let tmp = TempDir::new().unwrap();
    // ~50 KB and ~250 KB of 16-bit mono audio
    mono_16bit(&tmp.path().join("chime.wav"), 25_000);
    mono_16bit(&tmp.path().join("speech.wav"), 125_000);

    let reports: Vec<_> = discover(tmp.path())
        .unwrap()
        .iter()
        .map(|p| check_file(p))
        .collect();
    assert_eq!(reports.len(), 2);

    let accepted: Vec<_> = reports.iter().filter_map(|r| r.accepted()).collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].file_name(), "chime.wav");
    assert!(accepted[0].byte_size > 50_000 && accepted[0].byte_size < 51_000);

    let (_, speech_verdict) = reports[1].outcome.as_ref().unwrap();
    let kinds: Vec<_> = speech_verdict.errors().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![RejectionKind::SizeLimit]);
    assert_eq!(speech_verdict.warnings().count(), 0);
}

#[test]
fn unreadable_file_is_reported_not_fatal() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.wav"), b"RIFF\0\0\0\0JUNK").unwrap();
    mono_16bit(&tmp.path().join("ok.wav"), 100);

    let reports: Vec<_> = discover(tmp.path())
        .unwrap()
        .iter()
        .map(|p| check_file(p))
        .collect();

    assert!(matches!(
        reports[0].outcome,
        Err(ParseError::Malformed { .. })
    ));
    assert!(reports[1].accepted().is_some());
}

#[test]
fn rechecking_unchanged_folder_gives_same_verdicts() {
    let tmp = TempDir::new().unwrap();
    mono_16bit(&tmp.path().join("a.wav"), 1_000);
    mono_16bit(&tmp.path().join("b.wav"), 120_000);

    let verdicts = || -> Vec<_> {
        discover(tmp.path())
            .unwrap()
            .iter()
            .map(|p| check_file(p).outcome.unwrap().1)
            .collect()
    };
    assert_eq!(verdicts(), verdicts());
}
