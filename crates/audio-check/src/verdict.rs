//! Verdict: every rule applied to one candidate, nothing short-circuited.

use std::path::{Path, PathBuf};

use crate::candidate::{AudioCandidate, ParseError};
use crate::rules::{Advisory, CheckStatus, Rejection, Rule, RULES};

/// Outcome of one rule against one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Rule that was applied.
    pub rule: Rule,
    /// What it found.
    pub status: CheckStatus,
}

/// Per-candidate pass/fail with the full list of findings.
///
/// Warnings never exclude a file; any rejection does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// One entry per rule, in [`RULES`] order.
    pub checks: Vec<CheckResult>,
}

impl Verdict {
    /// `true` when no rule rejected the file.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Advisory findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Advisory> {
        self.checks.iter().filter_map(|c| match &c.status {
            CheckStatus::Warn(a) => Some(a),
            _ => None,
        })
    }

    /// Disqualifying findings.
    pub fn errors(&self) -> impl Iterator<Item = &Rejection> {
        self.checks.iter().filter_map(|c| match &c.status {
            CheckStatus::Fail(r) => Some(r),
            _ => None,
        })
    }
}

/// Apply every rule in [`RULES`] to `candidate`.
///
/// Pure function of the header fields: the same candidate always yields the
/// same verdict.
#[must_use]
pub fn validate(candidate: &AudioCandidate) -> Verdict {
    let checks = RULES
        .iter()
        .map(|&rule| CheckResult {
            rule,
            status: rule.evaluate(candidate),
        })
        .collect();
    Verdict { checks }
}

/// Inspection and validation result for one discovered file.
#[derive(Debug)]
pub struct FileReport {
    /// File that was checked.
    pub path: PathBuf,
    /// Header and verdict, or why the header could not be read.
    pub outcome: Result<(AudioCandidate, Verdict), ParseError>,
}

impl FileReport {
    /// The candidate, if it was readable and passed every hard rule.
    #[must_use]
    pub fn accepted(&self) -> Option<&AudioCandidate> {
        match &self.outcome {
            Ok((candidate, verdict)) if verdict.passed() => Some(candidate),
            _ => None,
        }
    }
}

/// Inspect and validate one file. An unreadable header is recorded in the
/// report rather than returned, so one bad file never stops the others.
pub fn check_file(path: &Path) -> FileReport {
    let outcome = AudioCandidate::inspect(path).map(|candidate| {
        let verdict = validate(&candidate);
        tracing::debug!(
            file = %path.display(),
            passed = verdict.passed(),
            "validated"
        );
        (candidate, verdict)
    });
    if let Err(e) = &outcome {
        tracing::debug!(file = %path.display(), error = %e, "header unreadable");
    }
    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}
