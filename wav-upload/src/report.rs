//! Console output for a provisioning run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use audio_check::{AudioCandidate, CheckResult, CheckStatus, DiscoveryError, FileReport};
use colored::Colorize;
use provision::{PlanAdvisory, PortSource, ResolvedPort, Reporter, Stage, UploadError, UploadPlan};

const RULE: &str = "============================================================";

#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::ImageAssembly => "Building SPIFFS image",
        Stage::Transfer => "Flashing image",
    }
}

pub fn banner() {
    println!("{}", RULE.cyan());
    println!("{}", "           ESP32 WAV upload tool".cyan().bold());
    println!("{}", RULE.cyan());
}

/// Prints each stage as [`provision::Pipeline`] reports it.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn discovered(&mut self, folder: &Path, files: &[PathBuf]) {
        println!();
        println!(
            "{}",
            format!(
                "📁 Found {} WAV file(s) in {}",
                files.len(),
                folder.display()
            )
            .bold()
        );
        println!("{}", "-".repeat(40).dimmed());
    }

    fn file_checked(&mut self, report: &FileReport) {
        match &report.outcome {
            Ok((candidate, verdict)) => {
                print_details(candidate);
                for check in &verdict.checks {
                    let line = check_line(check);
                    match check.status {
                        CheckStatus::Pass => println!("    {}", line.dimmed()),
                        CheckStatus::Warn(_) => println!("    {}", line.yellow()),
                        CheckStatus::Fail(_) => println!("    {}", line.red()),
                    }
                }
                if verdict.passed() {
                    println!("  {}", "✓ format check passed".green());
                }
            }
            Err(e) => {
                let name = report
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("  {}", name.bold());
                println!("  {} {}", "✗".red(), e.to_string().red());
            }
        }
        println!();
    }

    fn validated(&mut self, accepted: &[AudioCandidate], total_bytes: u64) {
        println!(
            "{}",
            format!("✓ Valid files: {}", accepted.len()).green().bold()
        );
        println!(
            "📊 Total size: {} bytes ({:.1} KB)",
            total_bytes,
            kib(total_bytes)
        );
    }

    fn port_resolved(&mut self, port: &ResolvedPort) {
        println!("🔌 Port: {}", port);
        if let PortSource::Detected { matches, .. } = &port.source {
            if matches.len() > 1 {
                println!(
                    "   {}",
                    format!("also found: {}", matches.join(", ")).dimmed()
                );
            }
        }
    }

    fn plan_ready(&mut self, plan: &UploadPlan, advisories: &[PlanAdvisory]) {
        println!(
            "💾 Partition: {} MiB at {} ({:.1} KB free after files)",
            plan.partition.mib(),
            plan.offset,
            kib(plan.headroom())
        );
        for advisory in advisories {
            println!("  {} {}", "⚠".yellow(), advisory.to_string().yellow());
        }
    }

    fn stage_started(&mut self, stage: Stage) {
        println!();
        println!("{}", format!("📡 {}...", stage_label(stage)).cyan().bold());
    }

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration) {
        println!(
            "{}",
            format!(
                "✓ {} done in {:.2}s",
                stage_label(stage),
                elapsed.as_secs_f64()
            )
            .green()
        );
    }
}

/// One report line per rule: glyph, rule label, and the finding if any.
fn check_line(check: &CheckResult) -> String {
    let label = check.rule.label();
    match &check.status {
        CheckStatus::Pass => format!("✓ {}", label),
        CheckStatus::Warn(advisory) => format!("⚠ {}: {}", label, advisory),
        CheckStatus::Fail(rejection) => format!("✗ {}: {}", label, rejection),
    }
}

fn print_details(c: &AudioCandidate) {
    println!("  {}", c.file_name().bold());
    println!("    size:        {} bytes ({:.1} KB)", c.byte_size, kib(c.byte_size));
    println!("    sample rate: {} Hz", c.sample_rate);
    println!("    channels:    {}", c.channels);
    println!("    bit depth:   {} bits", c.bits_per_sample);
    println!("    duration:    {:.2} s", c.duration_secs());
}

fn print_files(plan: &UploadPlan) {
    for file in &plan.files {
        println!("   - {}", file.file_name());
    }
}

pub fn checked(plan: &UploadPlan) {
    println!();
    println!("{}", "✓ Check complete, nothing was written".green().bold());
    println!("📋 Would upload:");
    print_files(plan);
    println!();
}

pub fn uploaded(plan: &UploadPlan) {
    println!();
    println!("{}", "🎉 WAV files uploaded".green().bold());
    println!("📋 Uploaded files:");
    print_files(plan);
    println!();
    println!("💡 Next steps:");
    println!("   1. Restart the ESP32 device");
    println!("   2. Check the serial log to confirm the files were mounted");
    if let Some(first) = plan.files.first() {
        println!(
            "   3. Play a clip with audio_play_wav_file(\"{}\", volume)",
            first.file_name()
        );
    }
    println!();
}

/// What to do next after `e`, one line per hint.
pub fn remedy(e: &UploadError) -> Vec<String> {
    match e {
        UploadError::Discovery(DiscoveryError::MissingFolder(_)) => vec![
            "create the folder and put the WAV files in it".into(),
            "or point --wav-folder at an existing one".into(),
        ],
        UploadError::Discovery(DiscoveryError::Walk(_)) => {
            vec!["check that the folder is readable by the current user".into()]
        }
        UploadError::NoWavFiles(_) => vec!["only files ending in .wav are picked up".into()],
        UploadError::NoValidFiles => {
            vec!["convert clips to 8 or 16-bit PCM, 1-2 channels, under 200 KB".into()]
        }
        UploadError::SizeLimit { .. } => vec![
            "remove some files or pass a larger --size".into(),
            "the partition table on the device must match".into(),
        ],
        UploadError::PortNotFound => {
            vec!["pass the port with --port (COM3, /dev/ttyUSB0)".into()]
        }
        UploadError::ToolNotFound { hint, .. } => vec![(*hint).to_string()],
        UploadError::Flash { .. } => vec![
            "check the USB cable and that no serial monitor holds the port".into(),
            "hold BOOT while resetting to force download mode".into(),
        ],
        UploadError::Spawn { .. } | UploadError::ImageBuild { .. } | UploadError::Scratch(_) => {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn every_user_fixable_error_has_a_hint() {
        let fixable = [
            UploadError::NoWavFiles(PathBuf::from("wav_files")),
            UploadError::NoValidFiles,
            UploadError::SizeLimit {
                total: 2,
                capacity: 1,
            },
            UploadError::PortNotFound,
            UploadError::ToolNotFound {
                tool: "mkspiffs",
                hint: "download it",
            },
        ];
        for e in &fixable {
            assert!(!remedy(e).is_empty(), "no hint for {e}");
        }
    }

    #[test]
    fn unreadable_folder_is_not_reported_as_missing() {
        let missing = UploadError::Discovery(DiscoveryError::MissingFolder(PathBuf::from("w")));
        assert!(remedy(&missing)[0].starts_with("create the folder"));

        let tmp = tempfile::TempDir::new().unwrap();
        let walk_err = walkdir::WalkDir::new(tmp.path().join("absent"))
            .into_iter()
            .find_map(Result::err)
            .unwrap();
        let unreadable = UploadError::Discovery(DiscoveryError::Walk(walk_err));
        let hints = remedy(&unreadable);
        assert!(hints.iter().all(|h| !h.contains("create the folder")));
        assert!(!hints.is_empty());
    }

    #[test]
    fn every_rule_gets_its_own_line() {
        let candidate = AudioCandidate {
            path: PathBuf::from("a_very_long_notification_chime_name.wav"),
            sample_rate: 32_000,
            channels: 4,
            bits_per_sample: 16,
            encoding: audio_check::SampleEncoding::Pcm,
            frames: 100,
            byte_size: 1_000,
        };
        let verdict = audio_check::validate(&candidate);
        let lines: Vec<String> = verdict.checks.iter().map(check_line).collect();

        assert_eq!(lines.len(), audio_check::RULES.len());
        assert_eq!(lines[0], "✓ size");
        assert!(lines[1].starts_with("⚠ sample rate: 32000 Hz"));
        assert!(lines[2].starts_with("✗ channels: 4 channels"));
        assert_eq!(lines[3], "✓ bit depth");
        assert_eq!(lines[4], "✓ encoding");
        assert!(lines[5].starts_with("⚠ file name:"));
    }

    #[test]
    fn tool_hint_is_passed_through() {
        let e = UploadError::ToolNotFound {
            tool: "esptool.py",
            hint: "install it with: pip install esptool",
        };
        assert_eq!(remedy(&e), ["install it with: pip install esptool"]);
    }
}
