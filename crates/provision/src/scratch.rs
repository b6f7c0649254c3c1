//! Scratch: private temp directory holding the staged files and the image.
//!
//! Everything the run writes to disk lives under one [`tempfile::TempDir`],
//! removed by [`Scratch::close`] or, failing that, on drop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use audio_check::AudioCandidate;
use tempfile::TempDir;

const STAGING_DIR: &str = "spiffs";
const IMAGE_FILE: &str = "spiffs_image.bin";

/// Temp directory for one run.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch directory under `root`, or the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("wav-upload-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "scratch directory created");
        Ok(Self { dir })
    }

    /// Scratch directory root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the image builder writes its output.
    #[must_use]
    pub fn image_path(&self) -> PathBuf {
        self.dir.path().join(IMAGE_FILE)
    }

    /// Copy `files` into a fresh staging folder and return its path.
    ///
    /// The folder holds exactly the accepted files, under their original
    /// names, so the image builder never sees rejected ones.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the first copy that fails.
    pub fn stage(&self, files: &[AudioCandidate]) -> io::Result<PathBuf> {
        let staging = self.dir.path().join(STAGING_DIR);
        fs::create_dir(&staging)?;
        for file in files {
            let name = file.path.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", file.path.display()),
                )
            })?;
            fs::copy(&file.path, staging.join(name))?;
        }
        tracing::debug!(count = files.len(), path = %staging.display(), "staged accepted files");
        Ok(staging)
    }

    /// Delete the directory and everything in it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if removal fails.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
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
    use audio_check::SampleEncoding;

    fn candidate(path: PathBuf) -> AudioCandidate {
        AudioCandidate {
            path,
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::Pcm,
            frames: 0,
            byte_size: 4,
        }
    }

    #[test]
    fn stage_copies_only_given_files() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("keep.wav"), b"RIFF").unwrap();
        fs::write(src.path().join("skip.wav"), b"RIFF").unwrap();

        let root = TempDir::new().unwrap();
        let scratch = Scratch::create(Some(root.path())).unwrap();
        let staging = scratch
            .stage(&[candidate(src.path().join("keep.wav"))])
            .unwrap();

        let names: Vec<_> = fs::read_dir(&staging)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["keep.wav"]);
        assert!(scratch.image_path().starts_with(scratch.path()));
    }

    #[test]
    fn close_removes_everything() {
        let root = TempDir::new().unwrap();
        let scratch = Scratch::create(Some(root.path())).unwrap();
        fs::write(scratch.image_path(), b"image").unwrap();
        scratch.close().unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_removes_everything() {
        let root = TempDir::new().unwrap();
        {
            let scratch = Scratch::create(Some(root.path())).unwrap();
            fs::write(scratch.image_path(), b"image").unwrap();
        }
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_fails_staging() {
        let root = TempDir::new().unwrap();
        let scratch = Scratch::create(Some(root.path())).unwrap();
        let err = scratch
            .stage(&[candidate(root.path().join("vanished.wav"))])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
