//! Transfer: write the image to device flash with `esptool`.

use std::path::Path;

use crate::command::{CommandOutput, CommandSpec, Executor};
use crate::config::FlashOffset;
use crate::error::UploadError;
use crate::image::DeviceImage;

/// Target chip passed to `--chip`.
pub const CHIP: &str = "esp32s3";

/// Serial baud rate. Higher rates corrupt transfers on some CH340 boards.
pub const BAUD: u32 = 115_200;

/// `esptool --chip esp32s3 --port <port> --baud 115200 write_flash -z <offset> <image>`
#[must_use]
pub fn flash_command(tool: &Path, port: &str, offset: FlashOffset, image: &Path) -> CommandSpec {
    CommandSpec::new(tool)
        .args(["--chip", CHIP])
        .arg("--port")
        .arg(port)
        .arg("--baud")
        .arg(BAUD.to_string())
        .args(["write_flash", "-z"])
        .arg(offset.to_string())
        .arg(image)
}

/// Flash `image` at `offset` through `port`.
///
/// # Errors
///
/// - [`UploadError::Spawn`] if the flasher cannot be started.
/// - [`UploadError::Flash`] on a non-zero exit, carrying both output
///   streams and the exit code.
pub fn transfer(
    executor: &impl Executor,
    tool: &Path,
    port: &str,
    offset: FlashOffset,
    image: &DeviceImage,
) -> Result<CommandOutput, UploadError> {
    let cmd = flash_command(tool, port, offset, &image.path);
    tracing::debug!(command = %cmd, bytes = image.size, "flashing");

    let out = executor.run(&cmd).map_err(|source| UploadError::Spawn {
        tool: tool.display().to_string(),
        source,
    })?;
    if !out.success() {
        return Err(UploadError::Flash {
            code: out.code,
            stdout: out.stdout,
            stderr: out.stderr,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    struct Exits(Option<i32>);

    impl Executor for Exits {
        fn locate(&self, _program: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, _cmd: &CommandSpec) -> io::Result<CommandOutput> {
            Ok(CommandOutput {
                code: self.0,
                stdout: "Connecting........_____".into(),
                stderr: "A fatal error occurred: Failed to connect to ESP32-S3".into(),
            })
        }
    }

    struct CannotSpawn;

    impl Executor for CannotSpawn {
        fn locate(&self, _program: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, _cmd: &CommandSpec) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "not executable"))
        }
    }

    fn image() -> DeviceImage {
        DeviceImage {
            path: PathBuf::from("/tmp/s/spiffs_image.bin"),
            size: 12_517_376,
        }
    }

    #[test]
    fn command_matches_flasher_contract() {
        let cmd = flash_command(
            Path::new("/usr/local/bin/esptool.py"),
            "/dev/ttyUSB0",
            FlashOffset::new(0x41_0000),
            Path::new("/tmp/s/spiffs_image.bin"),
        );
        assert_eq!(
            cmd.args_lossy(),
            [
                "--chip",
                "esp32s3",
                "--port",
                "/dev/ttyUSB0",
                "--baud",
                "115200",
                "write_flash",
                "-z",
                "0x410000",
                "/tmp/s/spiffs_image.bin"
            ]
        );
    }

    #[test]
    fn exit_zero_is_success() {
        let out = transfer(
            &Exits(Some(0)),
            Path::new("esptool.py"),
            "COM3",
            FlashOffset::new(0x41_0000),
            &image(),
        )
        .unwrap();
        assert!(out.success());
    }

    #[test]
    fn failure_carries_streams_and_code() {
        let err = transfer(
            &Exits(Some(2)),
            Path::new("esptool.py"),
            "COM3",
            FlashOffset::new(0x41_0000),
            &image(),
        )
        .unwrap_err();
        match err {
            UploadError::Flash {
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(code, Some(2));
                assert!(stdout.starts_with("Connecting"));
                assert!(stderr.contains("Failed to connect"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = transfer(
            &CannotSpawn,
            Path::new("esptool.py"),
            "COM3",
            FlashOffset::new(0x41_0000),
            &image(),
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::Spawn { .. }));
    }
}
