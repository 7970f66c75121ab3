use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use crate::error::{ReleaseError, Result};
use crate::exec::{CommandOutput, CommandRunner};

/// Command runner for tests: every command succeeds unless scripted otherwise.
///
/// Commands are keyed by their shell form, e.g. `"mix test"`.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, CommandOutput>,
    missing: Vec<String>,
    calls: RefCell<Vec<String>>,
}

fn key(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command` exit with status 1 and print `stderr`.
    pub fn fail(self, command: &str, stderr: &str) -> Self {
        self.respond(
            command,
            CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    pub fn respond(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    /// Pretends `program` is not on `PATH`.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Commands run so far, interactive ones prefixed with `"interactive "`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn output_for(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        if self.missing.iter().any(|p| p == program) {
            return Err(ReleaseError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("failed to start {}: not found", program),
            )));
        }
        Ok(self
            .responses
            .get(&key(program, args))
            .cloned()
            .unwrap_or(CommandOutput {
                success: true,
                code: Some(0),
                ..CommandOutput::default()
            }))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(key(program, args));
        self.output_for(program, args)
    }

    fn run_interactive(&self, program: &str, args: &[String]) -> Result<bool> {
        self.calls
            .borrow_mut()
            .push(format!("interactive {}", key(program, args)));
        Ok(self.output_for(program, args)?.success)
    }

    fn is_available(&self, program: &str) -> bool {
        !self.missing.iter().any(|p| p == program)
    }
}
