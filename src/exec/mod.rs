//! Narrow interface for running external tools.
//!
//! Every collaborator except version control goes through [`CommandRunner`]:
//! the test runner, formatter, linters, package builder, publisher and the
//! hosted-release CLI. Only the publish step is run interactively.

pub mod mock;

pub use mock::ScriptedRunner;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{ReleaseError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// The last `max_lines` non-empty lines of stderr, or of stdout when stderr is empty.
    pub fn tail(&self, max_lines: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join("\n")
    }

    /// Human-readable reason for a failed run.
    pub fn failure_reason(&self, command: &str) -> String {
        let status = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let tail = self.tail(5);
        if tail.is_empty() {
            format!("`{}` failed with {}", command, status)
        } else {
            format!("`{}` failed with {}:\n{}", command, status, tail)
        }
    }
}

/// Runs external programs on behalf of checks and steps.
pub trait CommandRunner {
    /// Runs to completion and returns the captured output.
    ///
    /// `Err` means the program could not be started at all.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Runs with the terminal attached, forwarding output as it arrives.
    ///
    /// Returns whether the program exited successfully.
    fn run_interactive(&self, program: &str, args: &[String]) -> Result<bool>;

    /// Whether `program` can be found on `PATH`.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs real processes in the project directory.
pub struct SystemRunner {
    root: PathBuf,
}

impl SystemRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SystemRunner { root: root.into() }
    }

    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.root);
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        log::debug!("running {} {:?} in {}", program, args, self.root.display());

        let output = self
            .command(program, args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, e))?;

        log::debug!("{} exited with {:?}", program, output.status.code());
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_interactive(&self, program: &str, args: &[String]) -> Result<bool> {
        log::debug!("running {} {:?} interactively", program, args);

        // stdin and stderr stay attached so credential prompts reach the user.
        // An interrupt from the terminal reaches the child through the shared
        // process group, which closes its stdout and ends the forwarding loop.
        let mut child = self
            .command(program, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        if let Some(stdout) = child.stdout.take() {
            forward(stdout, io::stdout())?;
        }

        let status = child.wait()?;
        log::debug!("{} exited with {:?}", program, status.code());
        Ok(status.success())
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn spawn_error(program: &str, e: io::Error) -> ReleaseError {
    ReleaseError::Io(io::Error::new(
        e.kind(),
        format!("failed to start {}: {}", program, e),
    ))
}

/// Copies bytes as soon as they are read, flushing after each chunk.
///
/// Prompts usually end without a newline, so line buffering would hide them.
pub fn forward(mut from: impl Read, mut to: impl Write) -> io::Result<u64> {
    let mut buf = [0u8; 1024];
    let mut total = 0u64;
    loop {
        let n = match from.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        to.write_all(&buf[..n])?;
        to.flush()?;
        total += n as u64;
    }
    Ok(total)
}

/// Best-effort text scan for tools that exit zero despite reporting errors.
///
/// A line mentioning the word "error" counts as a failure unless some line
/// says "no errors".
pub fn output_reports_errors(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.lines().any(|line| line.contains("no errors")) {
        return false;
    }
    lower.lines().any(|line| {
        line.split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == "error" || word == "errors")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_copies_everything() {
        let input = b"Username: ".repeat(300);
        let mut out = Vec::new();
        let copied = forward(&input[..], &mut out).unwrap();
        assert_eq!(copied as usize, input.len());
        assert_eq!(out, input);
    }

    #[test]
    fn test_output_reports_errors() {
        assert!(output_reports_errors("compiling\nerror: missing field"));
        assert!(output_reports_errors("2 Errors found"));
        assert!(!output_reports_errors("Building pkg 1.0.0\nno errors found"));
        assert!(!output_reports_errors("all good"));
        assert!(!output_reports_errors("terror_handler.ex compiled"));
    }

    #[test]
    fn test_tail_prefers_stderr() {
        let output = CommandOutput {
            success: false,
            code: Some(1),
            stdout: "one\ntwo\n".to_string(),
            stderr: "boom\n".to_string(),
        };
        assert_eq!(output.tail(5), "boom");
        assert_eq!(
            output.failure_reason("mix test"),
            "`mix test` failed with exit code 1:\nboom"
        );
    }

    #[test]
    fn test_tail_limits_lines() {
        let output = CommandOutput {
            stdout: "a\nb\n\nc\nd\n".to_string(),
            ..CommandOutput::default()
        };
        assert_eq!(output.tail(2), "c\nd");
    }

    #[test]
    fn test_missing_program_fails_to_start() {
        let runner = SystemRunner::new(".");
        let result = runner.run("/nonexistent/cut-release-tool", &[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("failed to start"));
        assert!(!runner.is_available("/nonexistent/cut-release-tool"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_exit_status() {
        let runner = SystemRunner::new(".");
        let ok = runner
            .run("sh", &["-c".to_string(), "echo hi".to_string()])
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.stdout.trim(), "hi");

        let failed = runner
            .run("sh", &["-c".to_string(), "echo bad >&2; exit 3".to_string()])
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.stderr.trim(), "bad");
    }
}
