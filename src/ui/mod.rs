//! User interface module - console reporting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - the [`Reporter`] the release pipeline prints through

use crate::pipeline::{CheckReport, PipelineResult, Reporter, StepReport};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{display_error, display_status, display_success};

/// Prints pipeline progress to the terminal as it happens.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    checks_started: bool,
    steps_started: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn status(&mut self, message: &str) {
        formatter::display_status(message);
    }

    fn check(&mut self, report: &CheckReport) {
        if !self.checks_started {
            self.checks_started = true;
            formatter::display_heading("Checks");
        }
        formatter::display_check(report);
    }

    fn checks_summary(&mut self, result: &PipelineResult) {
        formatter::display_checks_summary(result);
    }

    fn step_started(&mut self, description: &str) {
        if !self.steps_started {
            self.steps_started = true;
            formatter::display_heading("Release");
        }
        formatter::display_status(&formatter::started_line(description));
    }

    fn step(&mut self, report: &StepReport) {
        if !self.steps_started {
            self.steps_started = true;
            formatter::display_heading("Release");
        }
        formatter::display_step(report);
    }
}
