//! Process invocation for the tailscale CLI.
//!
//! Everything the console knows about daemon state comes through
//! [`CommandRunner::run`]. The production implementation shells out; tests
//! substitute a scripted runner.

use crate::error::{Result, TwintailError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful exit with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Exit code 1 with the given text on stderr.
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout then stderr, lossily decoded, trimmed and joined by a newline
    /// when both are present.
    pub fn combined(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        match (stdout.trim(), stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs the daemon CLI with an argument vector (binary name excluded).
///
/// `Err` is reserved for OS-level failures (the process could not be
/// started); a non-zero exit is reported through [`CommandOutput::success`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, args: &[String]) -> Result<CommandOutput>;
}

/// Runs the real `tailscale` binary.
#[derive(Debug, Clone)]
pub struct TailscaleCli {
    program: PathBuf,
}

impl TailscaleCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Look the binary up on `PATH`, keeping the raw name when it is absent so
    /// that the failure surfaces at invocation time.
    pub fn resolve(program: &str) -> Self {
        match which::which(program) {
            Ok(path) => {
                tracing::debug!(program, path = %path.display(), "Resolved tailscale binary");
                Self::new(path)
            },
            Err(e) => {
                tracing::debug!(program, error = %e, "tailscale binary not found on PATH");
                Self::new(program)
            },
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for TailscaleCli {
    fn default() -> Self {
        Self::resolve("tailscale")
    }
}

impl CommandRunner for TailscaleCli {
    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!(program = %self.program.display(), ?args, "Invoking tailscale");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| TwintailError::Execution {
                command: describe_command(&self.program, args),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Human-readable command line for error messages and logs.
pub fn describe_command(program: &Path, args: &[String]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    if args.is_empty() {
        name
    } else {
        format!("{} {}", name, args.join(" "))
    }
}
