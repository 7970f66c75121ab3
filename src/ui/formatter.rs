//! Pure formatting functions for UI output.
//!
//! Line builders return plain strings so they can be tested; the `display_*`
//! functions add color and print.

use console::style;

use crate::pipeline::{CheckReport, CheckStatus, PipelineResult, StepOutcome, StepReport};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a skip notice.
pub fn display_skipped(message: &str) {
    println!("{} {}", style("-").dim(), message);
}

/// Format and print a failure line (not the final error) in red.
pub fn display_failure(message: &str) {
    println!("{} {}", style("✗").red(), message);
}

/// Heading printed before each phase.
pub fn display_heading(title: &str) {
    println!("\n{}", style(title).bold());
}

/// Text of a check line, without the status marker.
pub fn check_line(report: &CheckReport) -> String {
    match &report.status {
        CheckStatus::Passed => report.description.clone(),
        status => format!("{}: {}", report.description, status),
    }
}

/// Prints one check result.
pub fn display_check(report: &CheckReport) {
    let line = check_line(report);
    match &report.status {
        CheckStatus::Passed => display_success(&line),
        CheckStatus::SkippedByUser(_)
        | CheckStatus::Unavailable(_)
        | CheckStatus::NotNeeded(_) => display_skipped(&line),
        CheckStatus::Failed(_) => display_failure(&line),
    }
}

/// Text of the checks summary line.
pub fn summary_line(result: &PipelineResult) -> String {
    format!(
        "{} passed, {} skipped, {} failed",
        result.passed, result.skipped, result.failed
    )
}

pub fn display_checks_summary(result: &PipelineResult) {
    let line = summary_line(result);
    if result.is_success() {
        println!("\n{}", style(line).green());
    } else {
        println!("\n{}", style(line).red().bold());
    }
}

/// Text printed when a step begins, before its output.
pub fn started_line(description: &str) -> String {
    format!("{}...", description)
}

/// Text of a step result line.
pub fn step_line(report: &StepReport) -> String {
    match &report.outcome {
        StepOutcome::Done => report.description.clone(),
        StepOutcome::Skipped(reason) => format!("{}: skipped ({})", report.description, reason),
        StepOutcome::Failed(reason) => format!("{}: failed: {}", report.description, reason),
    }
}

/// Prints one step result.
pub fn display_step(report: &StepReport) {
    let line = step_line(report);
    match &report.outcome {
        StepOutcome::Done => display_success(&line),
        StepOutcome::Skipped(_) => display_skipped(&line),
        StepOutcome::Failed(_) => display_failure(&line),
    }
}
