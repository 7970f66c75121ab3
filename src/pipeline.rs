//! Ordered execution of checks and release steps.
//!
//! Checks are diagnostic: every one runs, failures are collected, and the
//! caller decides afterwards. Steps depend on each other: the first failure
//! stops the run and nothing that already happened is undone.

use std::fmt;

use crate::error::{ReleaseError, Result};

/// The nine release checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckId {
    VcsClean,
    Branch,
    VcsInSync,
    Tests,
    Format,
    Lint,
    Typecheck,
    Changelog,
    PackageBuild,
}

impl CheckId {
    pub fn name(&self) -> &'static str {
        match self {
            CheckId::VcsClean => "vcs-clean",
            CheckId::Branch => "branch",
            CheckId::VcsInSync => "vcs-in-sync",
            CheckId::Tests => "tests",
            CheckId::Format => "format",
            CheckId::Lint => "lint",
            CheckId::Typecheck => "typecheck",
            CheckId::Changelog => "changelog",
            CheckId::PackageBuild => "package-build",
        }
    }
}

/// What a check predicate reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    /// The underlying capability is unavailable (e.g. an optional tool is not installed).
    Skipped(String),
    /// Earlier work in this run already establishes what the check verifies.
    NotNeeded(String),
    Failed(String),
}

/// Final classification of a check, keeping user skips apart from unavailable tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    SkippedByUser(String),
    Unavailable(String),
    NotNeeded(String),
    Failed(String),
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "passed"),
            CheckStatus::SkippedByUser(reason) => write!(f, "skipped ({})", reason),
            CheckStatus::Unavailable(reason) => write!(f, "skipped, unavailable: {}", reason),
            CheckStatus::NotNeeded(reason) => write!(f, "skipped, not needed: {}", reason),
            CheckStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// A read-only check. `skip` carries the reason when the user asked to skip it.
pub struct CheckSpec<'a> {
    pub id: CheckId,
    pub description: String,
    pub skip: Option<String>,
    predicate: Box<dyn Fn() -> CheckOutcome + 'a>,
}

impl<'a> CheckSpec<'a> {
    pub fn new(
        id: CheckId,
        description: impl Into<String>,
        skip: Option<String>,
        predicate: impl Fn() -> CheckOutcome + 'a,
    ) -> Self {
        CheckSpec {
            id,
            description: description.into(),
            skip,
            predicate: Box::new(predicate),
        }
    }
}

/// One line of the checks report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub id: CheckId,
    pub description: String,
    pub status: CheckStatus,
}

/// Aggregate of a checks run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineResult {
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<CheckReport>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn status_of(&self, id: CheckId) -> Option<&CheckStatus> {
        self.reports.iter().find(|r| r.id == id).map(|r| &r.status)
    }

    /// Converts a failed run into the terminal error.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ReleaseError::CheckFailure {
                failed: self.failed,
            })
        }
    }
}

/// What a release action reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

/// A release action, possibly mutating local files, the repository or remote state.
pub struct StepSpec<'a> {
    pub description: String,
    pub skip: Option<String>,
    action: Box<dyn FnMut() -> StepOutcome + 'a>,
}

impl<'a> StepSpec<'a> {
    pub fn new(
        description: impl Into<String>,
        skip: Option<String>,
        action: impl FnMut() -> StepOutcome + 'a,
    ) -> Self {
        StepSpec {
            description: description.into(),
            skip,
            action: Box::new(action),
        }
    }
}

/// One line of the steps report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub description: String,
    pub outcome: StepOutcome,
}

/// Receives progress as the pipeline runs, one call per entry, in execution order.
pub trait Reporter {
    fn status(&mut self, message: &str);
    fn check(&mut self, report: &CheckReport);
    fn checks_summary(&mut self, result: &PipelineResult);
    fn step_started(&mut self, description: &str);
    fn step(&mut self, report: &StepReport);
}

/// Runs every check in order, whatever earlier checks returned.
pub fn run_checks(checks: &[CheckSpec<'_>], reporter: &mut dyn Reporter) -> PipelineResult {
    let mut result = PipelineResult::default();

    for check in checks {
        let status = match &check.skip {
            Some(reason) => CheckStatus::SkippedByUser(reason.clone()),
            None => match (check.predicate)() {
                CheckOutcome::Passed => CheckStatus::Passed,
                CheckOutcome::Skipped(reason) => CheckStatus::Unavailable(reason),
                CheckOutcome::NotNeeded(reason) => CheckStatus::NotNeeded(reason),
                CheckOutcome::Failed(reason) => CheckStatus::Failed(reason),
            },
        };
        log::debug!("check {}: {}", check.id.name(), status);

        match status {
            CheckStatus::Passed => result.passed += 1,
            CheckStatus::SkippedByUser(_)
            | CheckStatus::Unavailable(_)
            | CheckStatus::NotNeeded(_) => result.skipped += 1,
            CheckStatus::Failed(_) => result.failed += 1,
        }

        let report = CheckReport {
            id: check.id,
            description: check.description.clone(),
            status,
        };
        reporter.check(&report);
        result.reports.push(report);
    }

    reporter.checks_summary(&result);
    result
}

/// Runs steps in order and stops at the first failure.
///
/// Steps that already ran are left in place.
pub fn run_steps(
    steps: &mut [StepSpec<'_>],
    reporter: &mut dyn Reporter,
) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(steps.len());

    for step in steps.iter_mut() {
        let outcome = match &step.skip {
            Some(reason) => StepOutcome::Skipped(reason.clone()),
            None => {
                reporter.step_started(&step.description);
                (step.action)()
            }
        };
        log::debug!("step '{}': {:?}", step.description, outcome);

        let report = StepReport {
            description: step.description.clone(),
            outcome,
        };
        reporter.step(&report);

        if let StepOutcome::Failed(reason) = &report.outcome {
            return Err(ReleaseError::StepFailure {
                step: report.description,
                reason: reason.clone(),
            });
        }
        reports.push(report);
    }

    Ok(reports)
}
