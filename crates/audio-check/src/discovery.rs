//! Discovery: list the WAV files at the top level of the input folder.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Error raised while enumerating the input folder.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The folder does not exist or is not a directory.
    #[error("WAV folder does not exist: {}", .0.display())]
    MissingFolder(PathBuf),
    /// Directory walk failed part-way.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Returns `true` when `path` has a `.wav` extension (any case).
pub fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// Collect the `*.wav` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into: the device filesystem is flat.
/// An entry that cannot be stat'ed (a dangling symlink, say) never aborts the
/// scan: a `*.wav` one is still listed so inspection reports it per file,
/// anything else is skipped.
///
/// # Errors
///
/// Returns [`DiscoveryError::MissingFolder`] if `dir` is not a directory, or
/// [`DiscoveryError::Walk`] if the folder itself cannot be read.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingFolder(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                match e.path().filter(|p| is_wav(p)) {
                    Some(path) => {
                        tracing::warn!(path = %path.display(), error = %e, "cannot stat WAV entry");
                        files.push(path.to_path_buf());
                    }
                    None => tracing::warn!(error = %e, "skipping unreadable folder entry"),
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.file_type().is_file() && is_wav(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!(folder = %dir.display(), count = files.len(), "discovered WAV files");
    Ok(files)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_wav_files_in_name_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.wav"), b"x").unwrap();
        fs::write(tmp.path().join("a.WAV"), b"x").unwrap();
        fs::write(tmp.path().join("cover.jpg"), b"x").unwrap();

        let files = discover(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.WAV", "b.wav"]);
    }

    #[test]
    fn does_not_descend_into_subfolders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("old")).unwrap();
        fs::write(tmp.path().join("old").join("stale.wav"), b"x").unwrap();
        fs::write(tmp.path().join("ring.wav"), b"x").unwrap();

        let files = discover(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("ring.wav"));
    }

    #[test]
    fn empty_folder_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover(&tmp.path().join("wav_files")).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingFolder(_)));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_do_not_abort_the_scan() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ring.wav"), b"x").unwrap();
        symlink(tmp.path().join("gone.txt"), tmp.path().join("notes.txt")).unwrap();
        symlink(tmp.path().join("gone.wav"), tmp.path().join("alarm.wav")).unwrap();

        let files = discover(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["alarm.wav", "ring.wav"]);

        // The broken WAV link fails on its own, at inspection.
        let report = crate::verdict::check_file(&files[0]);
        assert!(matches!(
            report.outcome,
            Err(crate::candidate::ParseError::Io { .. })
        ));
        assert!(report.accepted().is_none());
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(is_wav(Path::new("x.wav")));
        assert!(is_wav(Path::new("x.Wav")));
        assert!(!is_wav(Path::new("x.mp3")));
        assert!(!is_wav(Path::new("wav")));
    }
}
