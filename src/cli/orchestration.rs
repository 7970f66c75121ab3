//! Main release workflow orchestration logic
//!
//! The controller walks a fixed sequence of stages. Version and file errors end
//! the run before any check executes; a failed check ends it before any release
//! step; a failed step ends it where it stands.

use std::fmt;

use chrono::NaiveDate;

use crate::changelog;
use crate::checks::release_checks;
use crate::context::ReleaseContext;
use crate::error::{ReleaseError, Result};
use crate::manifest::{self, DocUpdate};
use crate::pipeline::{run_checks, run_steps, PipelineResult, Reporter, StepReport};
use crate::steps::{release_steps, tag_name};
use crate::version;

/// Controller stages, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveVersion,
    UpdateVersionFiles,
    ChangelogEntry,
    RunChecks,
    DryRunExit,
    Release,
    Success,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolveVersion => "resolve-version",
            Stage::UpdateVersionFiles => "update-version-files",
            Stage::ChangelogEntry => "changelog-entry",
            Stage::RunChecks => "run-checks",
            Stage::DryRunExit => "dry-run-exit",
            Stage::Release => "release",
            Stage::Success => "success",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    log::debug!("stage: {}", stage);
}

/// Result of a run that reached a successful end state.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSummary {
    /// Version recorded in the manifest before the run.
    pub previous: String,
    pub version: String,
    /// [`Stage::DryRunExit`] or [`Stage::Success`].
    pub stage: Stage,
    pub checks: PipelineResult,
    /// Empty for a dry run.
    pub steps: Vec<StepReport>,
}

impl ReleaseSummary {
    pub fn tag(&self) -> String {
        tag_name(&self.version)
    }

    pub fn is_dry_run(&self) -> bool {
        self.stage == Stage::DryRunExit
    }
}

/// Drives one release from version resolution to publishing.
pub struct ReleaseController<'a> {
    ctx: ReleaseContext<'a>,
    reporter: &'a mut dyn Reporter,
    today: NaiveDate,
}

impl<'a> ReleaseController<'a> {
    /// `today` is the date stamped into the changelog.
    pub fn new(ctx: ReleaseContext<'a>, reporter: &'a mut dyn Reporter, today: NaiveDate) -> Self {
        ReleaseController {
            ctx,
            reporter,
            today,
        }
    }

    /// Runs the release for a version selector (`major`, `minor`, `patch`,
    /// `current` or an explicit `X.Y.Z`).
    pub fn run(&mut self, version_arg: &str) -> Result<ReleaseSummary> {
        let config = self.ctx.config;
        let entry = match config.changelog_entry.as_deref().map(str::trim) {
            Some("") => {
                return Err(ReleaseError::usage("--changelog-entry must not be empty"));
            }
            entry => entry,
        };

        enter(Stage::ResolveVersion);
        let previous = manifest::read_current_version(&self.ctx.manifest_path())?;
        let version = version::resolve(version_arg, &previous)?;
        if previous == version {
            self.reporter
                .status(&format!("Releasing {} (version unchanged)", version));
        } else {
            self.reporter
                .status(&format!("Releasing {} (was {})", version, previous));
        }

        enter(Stage::UpdateVersionFiles);
        self.update_version_files(&previous, &version)?;

        if let Some(entry) = entry {
            enter(Stage::ChangelogEntry);
            self.inject_entry(entry)?;
        }

        enter(Stage::RunChecks);
        let checks = {
            let specs = release_checks(&self.ctx, entry.is_some());
            run_checks(&specs, &mut *self.reporter).into_result()?
        };

        if config.dry_run {
            enter(Stage::DryRunExit);
            self.reporter.status(&format!(
                "Dry run complete: {} would be released, nothing was changed",
                tag_name(&version)
            ));
            return Ok(ReleaseSummary {
                previous,
                version,
                stage: Stage::DryRunExit,
                checks,
                steps: Vec::new(),
            });
        }

        enter(Stage::Release);
        let steps = {
            let mut specs = release_steps(&self.ctx, &version, self.today);
            run_steps(&mut specs, &mut *self.reporter)?
        };

        enter(Stage::Success);
        Ok(ReleaseSummary {
            previous,
            version,
            stage: Stage::Success,
            checks,
            steps,
        })
    }

    fn update_version_files(&mut self, previous: &str, version: &str) -> Result<()> {
        let config = self.ctx.config;
        if previous == version {
            log::debug!("version unchanged, leaving version files alone");
            return Ok(());
        }

        if config.dry_run {
            self.reporter.status(&format!(
                "Would update {} from {} to {}",
                config.manifest.display(),
                previous,
                version
            ));
            self.reporter.status(&format!(
                "Would update {} constraint to {}",
                config.readme.display(),
                manifest::constraint_for(version)
            ));
            return Ok(());
        }

        manifest::update_version(&self.ctx.manifest_path(), previous, version)?;
        self.reporter.status(&format!(
            "Updated {} to {}",
            config.manifest.display(),
            version
        ));

        let readme = config.readme.display();
        match manifest::update_dependency_reference(&self.ctx.readme_path(), previous, version)? {
            DocUpdate::Updated { from, to } => self
                .reporter
                .status(&format!("Updated {} constraint {} -> {}", readme, from, to)),
            DocUpdate::Unchanged(constraint) => self
                .reporter
                .status(&format!("{} constraint {} unchanged", readme, constraint)),
            DocUpdate::Skipped(reason) => self
                .reporter
                .status(&format!("Skipped {} update: {}", readme, reason)),
        }
        Ok(())
    }

    fn inject_entry(&mut self, entry: &str) -> Result<()> {
        let changelog_name = self.ctx.config.changelog.display();
        if self.ctx.config.dry_run {
            self.reporter
                .status(&format!("Would add entry to {}: {}", changelog_name, entry));
            return Ok(());
        }

        changelog::insert_entry(&self.ctx.changelog_path(), entry)?;
        self.reporter
            .status(&format!("Added entry to {}", changelog_name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ResolveVersion.to_string(), "resolve-version");
        assert_eq!(Stage::DryRunExit.to_string(), "dry-run-exit");
    }

    #[test]
    fn test_summary_tag() {
        let summary = ReleaseSummary {
            previous: "1.2.3".to_string(),
            version: "1.3.0".to_string(),
            stage: Stage::DryRunExit,
            checks: PipelineResult::default(),
            steps: Vec::new(),
        };
        assert_eq!(summary.tag(), "v1.3.0");
        assert!(summary.is_dry_run());
    }
}
