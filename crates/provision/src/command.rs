//! Typed external commands and the executor that runs them.
//!
//! Arguments are kept as a list and handed to the OS one by one; nothing is
//! ever joined into a shell string. The [`Executor`] trait is the seam tests
//! use to stand in for `mkspiffs` and `esptool`.

use core::fmt;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One process invocation: executable, argument list, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable path (usually resolved from PATH).
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Working directory, inherited when `None`.
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Start a command for `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir` instead of the current directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Arguments as lossy UTF-8, for assertions and logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Build the `std::process::Command` for this spec.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Exit code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Locates and runs external programs.
pub trait Executor {
    /// Find `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run `cmd` to completion, capturing both output streams.
    ///
    /// Blocks until the process exits; no timeout is applied.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process cannot be started.
    fn run(&self, cmd: &CommandSpec) -> io::Result<CommandOutput>;
}

/// [`Executor`] backed by real processes and the `PATH` variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        env::split_paths(&path).find_map(|dir| executable_in(&dir, program))
    }

    fn run(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        tracing::debug!(command = %cmd, "spawning");
        let output = cmd.to_command().output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Windows resolves `esptool.py` through `esptool.py.exe` shims as well.
#[cfg(windows)]
const EXE_SUFFIXES: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXE_SUFFIXES: &[&str] = &[""];

fn executable_in(dir: &Path, program: &str) -> Option<PathBuf> {
    EXE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{}{}", program, suffix)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_argument_order() {
        let spec = CommandSpec::new("mkspiffs")
            .arg("-c")
            .arg("/tmp/stage")
            .args(["-p", "256"]);
        assert_eq!(spec.args_lossy(), ["-c", "/tmp/stage", "-p", "256"]);
        assert_eq!(spec.to_string(), "mkspiffs -c /tmp/stage -p 256");
    }

    #[test]
    fn arguments_are_not_split_on_spaces() {
        let spec = CommandSpec::new("esptool.py").arg("my sounds/ring.bin");
        assert_eq!(spec.args.len(), 1);
    }

    #[test]
    fn current_dir_is_recorded() {
        let spec = CommandSpec::new("mkspiffs").current_dir("/work");
        assert_eq!(spec.current_dir, Some(PathBuf::from("/work")));
        let cmd = spec.to_command();
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/work")));
    }

    #[test]
    fn output_success_means_exit_zero() {
        let ok = CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        };
        let killed = CommandOutput::default();
        assert!(ok.success());
        assert!(!killed.success());
    }

    #[test]
    fn locate_misses_unknown_program() {
        assert!(SystemExecutor
            .locate("definitely-not-a-real-tool-7f3a")
            .is_none());
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_captures_exit_code_and_streams() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let out = SystemExecutor.run(&spec).unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }
}
