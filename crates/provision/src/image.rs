//! Image assembly: run `mkspiffs` over the staged files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{CommandSpec, Executor};
use crate::config::PartitionSize;
use crate::error::UploadError;

/// SPIFFS logical page size the firmware is built with.
pub const PAGE_SIZE: u32 = 256;

/// SPIFFS logical block size the firmware is built with.
pub const BLOCK_SIZE: u32 = 4096;

/// The filesystem image produced for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceImage {
    /// Image file inside the scratch directory.
    pub path: PathBuf,
    /// Size on disk.
    pub size: u64,
}

/// `mkspiffs -c <src_dir> -s <size_bytes> -p 256 -b 4096 <output>`
#[must_use]
pub fn build_command(
    tool: &Path,
    src_dir: &Path,
    partition: PartitionSize,
    output: &Path,
) -> CommandSpec {
    CommandSpec::new(tool)
        .arg("-c")
        .arg(src_dir)
        .arg("-s")
        .arg(partition.image_bytes().to_string())
        .arg("-p")
        .arg(PAGE_SIZE.to_string())
        .arg("-b")
        .arg(BLOCK_SIZE.to_string())
        .arg(output)
}

/// Build the SPIFFS image for `src_dir` at `output`.
///
/// # Errors
///
/// - [`UploadError::Spawn`] if the builder cannot be started.
/// - [`UploadError::ImageBuild`] on a non-zero exit, carrying the builder's
///   stderr verbatim, or when it exits cleanly without writing `output`.
pub fn assemble(
    executor: &impl Executor,
    tool: &Path,
    src_dir: &Path,
    partition: PartitionSize,
    output: &Path,
) -> Result<DeviceImage, UploadError> {
    let cmd = build_command(tool, src_dir, partition, output);
    tracing::debug!(command = %cmd, "building SPIFFS image");

    let out = executor.run(&cmd).map_err(|source| UploadError::Spawn {
        tool: tool.display().to_string(),
        source,
    })?;
    if !out.success() {
        return Err(UploadError::ImageBuild {
            code: out.code,
            stderr: out.stderr,
        });
    }

    let size = fs::metadata(output)
        .map_err(|e| UploadError::ImageBuild {
            code: out.code,
            stderr: format!("builder reported success but {}: {}", output.display(), e),
        })?
        .len();
    tracing::debug!(path = %output.display(), size, "SPIFFS image ready");

    Ok(DeviceImage {
        path: output.to_path_buf(),
        size,
    })
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
    use crate::command::CommandOutput;
    use std::io;
    use tempfile::TempDir;

    /// Exits with `code`; writes `output` first when `write` is set.
    struct FakeBuilder {
        code: i32,
        write: bool,
    }

    impl Executor for FakeBuilder {
        fn locate(&self, _program: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
            if self.write {
                let output = cmd.args.last().unwrap();
                fs::write(output, vec![0xFFu8; 4096])?;
            }
            Ok(CommandOutput {
                code: Some(self.code),
                stdout: String::new(),
                stderr: if self.code == 0 {
                    String::new()
                } else {
                    "SPIFFS_write error(-10001): File system is full.".into()
                },
            })
        }
    }

    #[test]
    fn command_matches_builder_contract() {
        let cmd = build_command(
            Path::new("/usr/bin/mkspiffs"),
            Path::new("/tmp/s/spiffs"),
            PartitionSize::new(12).unwrap(),
            Path::new("/tmp/s/spiffs_image.bin"),
        );
        assert_eq!(cmd.program, PathBuf::from("/usr/bin/mkspiffs"));
        assert_eq!(
            cmd.args_lossy(),
            [
                "-c",
                "/tmp/s/spiffs",
                "-s",
                "12517376",
                "-p",
                "256",
                "-b",
                "4096",
                "/tmp/s/spiffs_image.bin"
            ]
        );
    }

    #[test]
    fn non_default_size_uses_mib_formula() {
        let cmd = build_command(
            Path::new("mkspiffs"),
            Path::new("src"),
            PartitionSize::new(2).unwrap(),
            Path::new("out.bin"),
        );
        assert_eq!(cmd.args_lossy()[3], "2097152");
    }

    #[test]
    fn success_returns_image_with_size() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("spiffs_image.bin");
        let image = assemble(
            &FakeBuilder {
                code: 0,
                write: true,
            },
            Path::new("mkspiffs"),
            tmp.path(),
            PartitionSize::default(),
            &out,
        )
        .unwrap();
        assert_eq!(image.path, out);
        assert_eq!(image.size, 4096);
    }

    #[test]
    fn failure_surfaces_stderr() {
        let tmp = TempDir::new().unwrap();
        let err = assemble(
            &FakeBuilder {
                code: 1,
                write: false,
            },
            Path::new("mkspiffs"),
            tmp.path(),
            PartitionSize::default(),
            &tmp.path().join("spiffs_image.bin"),
        )
        .unwrap_err();
        match err {
            UploadError::ImageBuild { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "SPIFFS_write error(-10001): File system is full.");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn clean_exit_without_output_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = assemble(
            &FakeBuilder {
                code: 0,
                write: false,
            },
            Path::new("mkspiffs"),
            tmp.path(),
            PartitionSize::default(),
            &tmp.path().join("spiffs_image.bin"),
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::ImageBuild { code: Some(0), .. }));
    }
}
