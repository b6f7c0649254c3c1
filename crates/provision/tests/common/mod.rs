//! Shared fixtures: a recording executor, a fixed port list, WAV writers.

#![allow(
    dead_code,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use provision::{CommandOutput, CommandSpec, Executor, PortEnumerator, PortInfo};

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Contents of the `-c` directory at the moment `mkspiffs` ran.
    pub staged: Vec<String>,
}

/// Fake `mkspiffs`/`esptool`. Every tool is "installed" unless listed in
/// `missing`; the image builder writes a 4 KiB output file when it exits 0.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub missing: Vec<&'static str>,
    pub mkspiffs_code: i32,
    pub esptool_code: i32,
    pub calls: RefCell<Vec<Call>>,
}

impl RecordingExecutor {
    pub fn without(tools: &[&'static str]) -> Self {
        Self {
            missing: tools.to_vec(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

fn is_image_builder(program: &Path) -> bool {
    program
        .file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with("mkspiffs"))
}

impl Executor for RecordingExecutor {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(&program) {
            None
        } else {
            Some(PathBuf::from("/opt/fake/bin").join(program))
        }
    }

    fn run(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        let args = cmd.args_lossy();
        let builder = is_image_builder(&cmd.program);

        let mut staged = Vec::new();
        if builder {
            let src = args
                .iter()
                .position(|a| a == "-c")
                .and_then(|i| args.get(i + 1))
                .expect("mkspiffs called without -c");
            staged = fs::read_dir(src)?
                .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
                .collect::<io::Result<_>>()?;
            staged.sort();
        }

        self.calls.borrow_mut().push(Call {
            program: cmd.program.clone(),
            args: args.clone(),
            staged,
        });

        let code = if builder {
            self.mkspiffs_code
        } else {
            self.esptool_code
        };
        if builder && code == 0 {
            let output = args.last().expect("mkspiffs called without output");
            fs::write(output, vec![0xFFu8; 4096])?;
        }
        Ok(CommandOutput {
            code: Some(code),
            stdout: if builder {
                String::new()
            } else {
                "Hash of data verified.".into()
            },
            stderr: if code == 0 {
                String::new()
            } else {
                "A fatal error occurred: Failed to connect to ESP32-S3".into()
            },
        })
    }
}

/// Port enumerator returning a fixed list.
#[derive(Debug, Default)]
pub struct FixedPorts(pub Vec<PortInfo>);

impl FixedPorts {
    /// A single CP210x bridge on `name`.
    pub fn cp210x(name: &str) -> Self {
        Self(vec![PortInfo {
            name: name.into(),
            usb_id: Some((0x10c4, 0xea60)),
        }])
    }
}

impl PortEnumerator for FixedPorts {
    fn ports(&self) -> io::Result<Vec<PortInfo>> {
        Ok(self.0.clone())
    }
}

/// Mono 16-bit 44.1 kHz PCM; two bytes per frame plus a 44-byte header.
pub fn mono_16bit(path: &Path, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for i in 0..frames {
        writer
            .write_sample((i % 128) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).expect("read dir").count()
}
