//! External executables the run depends on.

use std::path::PathBuf;

use crate::command::Executor;
use crate::error::UploadError;

/// An executable looked up by name on the search path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTool {
    /// Name reported when the tool is missing; tried first.
    pub name: &'static str,
    /// Other names the same tool installs under, tried in order.
    pub aliases: &'static [&'static str],
    /// Where to get it.
    pub hint: &'static str,
}

/// SPIFFS image builder.
pub const MKSPIFFS: ExternalTool = ExternalTool {
    name: "mkspiffs",
    aliases: &[],
    hint: "download it from https://github.com/igrr/mkspiffs/releases",
};

/// Espressif flasher. pip installs `esptool.py` on older releases and
/// `esptool` on newer ones.
pub const ESPTOOL: ExternalTool = ExternalTool {
    name: "esptool.py",
    aliases: &["esptool"],
    hint: "install it with: pip install esptool",
};

impl ExternalTool {
    /// Resolve the tool to an executable path.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::ToolNotFound`] if no name resolves.
    pub fn resolve(&self, executor: &impl Executor) -> Result<PathBuf, UploadError> {
        core::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .find_map(|name| executor.locate(name))
            .inspect(|path| tracing::debug!(tool = self.name, path = %path.display(), "resolved"))
            .ok_or(UploadError::ToolNotFound {
                tool: self.name,
                hint: self.hint,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, CommandSpec};
    use std::io;

    struct OnPath(&'static [&'static str]);

    impl Executor for OnPath {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.0
                .contains(&program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }

        fn run(&self, _cmd: &CommandSpec) -> io::Result<CommandOutput> {
            Ok(CommandOutput::default())
        }
    }

    #[test]
    fn primary_name_wins() {
        let path = ESPTOOL.resolve(&OnPath(&["esptool.py", "esptool"])).unwrap();
        assert_eq!(path, PathBuf::from("/usr/bin/esptool.py"));
    }

    #[test]
    fn falls_back_to_alias() {
        let path = ESPTOOL.resolve(&OnPath(&["esptool"])).unwrap();
        assert_eq!(path, PathBuf::from("/usr/bin/esptool"));
    }

    #[test]
    fn missing_tool_reports_name_and_hint() {
        let err = MKSPIFFS.resolve(&OnPath(&[])).unwrap_err();
        assert!(matches!(
            err,
            UploadError::ToolNotFound {
                tool: "mkspiffs",
                ..
            }
        ));
    }
}
