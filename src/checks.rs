//! The fixed set of pre-release checks.

use std::fs;

use crate::changelog;
use crate::config::CommandConfig;
use crate::context::ReleaseContext;
use crate::exec::output_reports_errors;
use crate::pipeline::{CheckId, CheckOutcome, CheckSpec};

fn skip_flag(enabled: bool, flag: &str) -> Option<String> {
    enabled.then(|| format!("--{}", flag))
}

/// Builds the checks in run order.
///
/// `entry_prepared` is set when a changelog entry was supplied, which already
/// guarantees an unreleased section, so that check reports itself as not needed.
pub fn release_checks<'a>(ctx: &'a ReleaseContext<'a>, entry_prepared: bool) -> Vec<CheckSpec<'a>> {
    let skip = ctx.config.skip;
    let branch = &ctx.config.branch;
    let remote = &ctx.config.remote;
    let commands = &ctx.config.commands;

    vec![
        CheckSpec::new(
            CheckId::VcsClean,
            "Working tree is clean",
            skip_flag(skip.vcs, "skip-vcs"),
            move || check_clean(ctx),
        ),
        CheckSpec::new(
            CheckId::Branch,
            format!("On branch {}", branch),
            skip_flag(skip.vcs, "skip-vcs"),
            move || check_branch(ctx),
        ),
        CheckSpec::new(
            CheckId::VcsInSync,
            format!("In sync with {}/{}", remote, branch),
            skip_flag(skip.vcs, "skip-vcs"),
            move || check_in_sync(ctx),
        ),
        CheckSpec::new(
            CheckId::Tests,
            "Tests pass",
            skip_flag(skip.tests, "skip-tests"),
            move || run_command(ctx, &commands.tests),
        ),
        CheckSpec::new(
            CheckId::Format,
            "Code is formatted",
            skip_flag(skip.format, "skip-format"),
            move || run_command(ctx, &commands.format),
        ),
        CheckSpec::new(
            CheckId::Lint,
            "Lint passes",
            skip_flag(skip.lint, "skip-lint"),
            move || run_optional_command(ctx, &commands.lint),
        ),
        CheckSpec::new(
            CheckId::Typecheck,
            "Type checks pass",
            skip_flag(skip.typecheck, "skip-typecheck"),
            move || run_optional_command(ctx, &commands.typecheck),
        ),
        CheckSpec::new(
            CheckId::Changelog,
            "Changelog has an unreleased section",
            skip_flag(skip.changelog, "skip-changelog"),
            move || {
                if entry_prepared {
                    CheckOutcome::NotNeeded("entry supplied with --changelog-entry".to_string())
                } else {
                    check_changelog(ctx)
                }
            },
        ),
        CheckSpec::new(
            CheckId::PackageBuild,
            "Package builds",
            skip_flag(skip.package_dry_run, "skip-package-dry-run"),
            move || run_command(ctx, &commands.package_build),
        ),
    ]
}

fn check_clean(ctx: &ReleaseContext<'_>) -> CheckOutcome {
    // The release rewrites these itself before the checks run.
    let own_files = ctx.version_files();
    match ctx.repo.dirty_paths() {
        Ok(paths) => {
            let dirty: Vec<String> = paths
                .into_iter()
                .filter(|p| !own_files.contains(p))
                .collect();
            if dirty.is_empty() {
                CheckOutcome::Passed
            } else {
                CheckOutcome::Failed(format!("uncommitted changes: {}", dirty.join(", ")))
            }
        }
        Err(e) => CheckOutcome::Failed(e.to_string()),
    }
}

fn check_branch(ctx: &ReleaseContext<'_>) -> CheckOutcome {
    let expected = &ctx.config.branch;
    match ctx.repo.current_branch() {
        Ok(Some(current)) if &current == expected => CheckOutcome::Passed,
        Ok(Some(current)) => {
            CheckOutcome::Failed(format!("on branch '{}', expected '{}'", current, expected))
        }
        Ok(None) => CheckOutcome::Failed("HEAD is detached".to_string()),
        Err(e) => CheckOutcome::Failed(e.to_string()),
    }
}

fn check_in_sync(ctx: &ReleaseContext<'_>) -> CheckOutcome {
    let branch = &ctx.config.branch;
    let remote = &ctx.config.remote;

    if let Err(e) = ctx.repo.fetch(remote) {
        return CheckOutcome::Failed(format!("cannot fetch {}: {}", remote, e));
    }

    match ctx.repo.divergence(branch, remote) {
        Ok(Some(d)) if d.in_sync() => CheckOutcome::Passed,
        Ok(Some(d)) if d.ahead > 0 && d.behind > 0 => CheckOutcome::Failed(format!(
            "{} has diverged from {}/{} ({} ahead, {} behind)",
            branch, remote, branch, d.ahead, d.behind
        )),
        Ok(Some(d)) if d.behind > 0 => CheckOutcome::Failed(format!(
            "{} commit(s) behind {}/{}",
            d.behind, remote, branch
        )),
        Ok(Some(d)) => CheckOutcome::Failed(format!(
            "{} unpushed commit(s) on {}",
            d.ahead, branch
        )),
        Ok(None) => CheckOutcome::Failed(format!("no remote branch {}/{}", remote, branch)),
        Err(e) => CheckOutcome::Failed(e.to_string()),
    }
}

fn check_changelog(ctx: &ReleaseContext<'_>) -> CheckOutcome {
    let path = ctx.changelog_path();
    match fs::read_to_string(&path) {
        Ok(contents) if changelog::has_unreleased_section(&contents) => CheckOutcome::Passed,
        Ok(_) => CheckOutcome::Failed(format!(
            "no '## Unreleased' section in {}",
            ctx.config.changelog.display()
        )),
        Err(e) => CheckOutcome::Failed(format!("cannot read {}: {}", path.display(), e)),
    }
}

/// Runs a tool and maps its exit status to an outcome.
fn run_command(ctx: &ReleaseContext<'_>, command: &CommandConfig) -> CheckOutcome {
    match ctx.runner.run(&command.program, &command.args) {
        Ok(output) if output.success => {
            if command.scan_output
                && output_reports_errors(&format!("{}\n{}", output.stdout, output.stderr))
            {
                CheckOutcome::Failed(format!(
                    "`{}` reported errors:\n{}",
                    command.display(),
                    output.tail(5)
                ))
            } else {
                CheckOutcome::Passed
            }
        }
        Ok(output) => CheckOutcome::Failed(output.failure_reason(&command.display())),
        Err(e) => CheckOutcome::Failed(e.to_string()),
    }
}

/// Like [`run_command`], but a missing tool or dependency is a skip.
fn run_optional_command(ctx: &ReleaseContext<'_>, command: &CommandConfig) -> CheckOutcome {
    if !ctx.runner.is_available(&command.program) {
        return CheckOutcome::Skipped(format!("{} is not installed", command.program));
    }

    if let Some(required) = &command.requires {
        match fs::read_to_string(ctx.manifest_path()) {
            Ok(manifest) if manifest.contains(required.as_str()) => {}
            Ok(_) => {
                return CheckOutcome::Skipped(format!(
                    "{} is not a dependency in {}",
                    required,
                    ctx.config.manifest.display()
                ))
            }
            Err(e) => return CheckOutcome::Failed(e.to_string()),
        }
    }

    run_command(ctx, command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::exec::{CommandOutput, ScriptedRunner};
    use crate::git::{Divergence, MockRepository};
    use crate::pipeline::{
        run_checks, CheckReport, CheckStatus, PipelineResult, Reporter, StepReport,
    };
    use tempfile::TempDir;

    struct Quiet;

    impl Reporter for Quiet {
        fn status(&mut self, _message: &str) {}
        fn check(&mut self, _report: &CheckReport) {}
        fn checks_summary(&mut self, _result: &PipelineResult) {}
        fn step_started(&mut self, _description: &str) {}
        fn step(&mut self, _report: &StepReport) {}
    }

    fn project(manifest: &str, changelog: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mix.exs"), manifest).unwrap();
        fs::write(dir.path().join("CHANGELOG.md"), changelog).unwrap();
        dir
    }

    fn default_project() -> TempDir {
        project(
            "@version \"1.2.3\"\n",
            "# Changelog\n\n## Unreleased\n\n- Fix things\n",
        )
    }

    fn run(
        dir: &TempDir,
        config: &RunConfig,
        repo: &MockRepository,
        runner: &ScriptedRunner,
        entry_prepared: bool,
    ) -> PipelineResult {
        let ctx = ReleaseContext {
            root: dir.path(),
            config,
            repo,
            runner,
        };
        let checks = release_checks(&ctx, entry_prepared);
        run_checks(&checks, &mut Quiet)
    }

    #[test]
    fn test_checks_run_in_fixed_order() {
        let dir = default_project();
        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &ScriptedRunner::new(),
            false,
        );
        let order: Vec<&str> = result.reports.iter().map(|r| r.id.name()).collect();
        assert_eq!(
            order,
            vec![
                "vcs-clean",
                "branch",
                "vcs-in-sync",
                "tests",
                "format",
                "lint",
                "typecheck",
                "changelog",
                "package-build"
            ]
        );
        assert!(result.is_success());
    }

    #[test]
    fn test_optional_tools_without_dependency_are_unavailable() {
        let dir = default_project();
        let runner = ScriptedRunner::new();
        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &runner,
            false,
        );
        assert_eq!(
            result.status_of(CheckId::Lint),
            Some(&CheckStatus::Unavailable(
                ":credo is not a dependency in mix.exs".to_string()
            ))
        );
        assert!(!runner.calls().iter().any(|c| c.contains("credo")));
        assert!(!runner.calls().iter().any(|c| c.contains("dialyzer")));
    }

    #[test]
    fn test_optional_tools_run_when_declared() {
        let dir = project(
            "@version \"1.2.3\"\n{:credo, \"~> 1.7\"}\n{:dialyxir, \"~> 1.4\"}\n",
            "## Unreleased\n",
        );
        let runner = ScriptedRunner::new().fail("mix dialyzer", "type mismatch");
        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &runner,
            false,
        );
        assert_eq!(result.status_of(CheckId::Lint), Some(&CheckStatus::Passed));
        assert!(matches!(
            result.status_of(CheckId::Typecheck),
            Some(CheckStatus::Failed(reason)) if reason.contains("type mismatch")
        ));
        assert!(runner.calls().contains(&"mix credo --strict".to_string()));
    }

    #[test]
    fn test_missing_program_is_unavailable_for_optional_checks_only() {
        let dir = default_project();
        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &ScriptedRunner::new().without("mix"),
            false,
        );
        assert_eq!(
            result.status_of(CheckId::Lint),
            Some(&CheckStatus::Unavailable("mix is not installed".to_string()))
        );
        assert!(matches!(
            result.status_of(CheckId::Tests),
            Some(CheckStatus::Failed(_))
        ));
    }

    #[test]
    fn test_vcs_clean_ignores_release_files() {
        let dir = default_project();
        let mut repo = MockRepository::new();
        repo.dirty = vec!["mix.exs".to_string(), "CHANGELOG.md".to_string()];
        let result = run(
            &dir,
            &RunConfig::default(),
            &repo,
            &ScriptedRunner::new(),
            false,
        );
        assert_eq!(result.status_of(CheckId::VcsClean), Some(&CheckStatus::Passed));

        repo.dirty.push("lib/widget.ex".to_string());
        let result = run(
            &dir,
            &RunConfig::default(),
            &repo,
            &ScriptedRunner::new(),
            false,
        );
        assert_eq!(
            result.status_of(CheckId::VcsClean),
            Some(&CheckStatus::Failed(
                "uncommitted changes: lib/widget.ex".to_string()
            ))
        );
    }

    #[test]
    fn test_branch_and_sync_failures() {
        let dir = default_project();
        let mut repo = MockRepository::new();
        repo.branch = Some("feature".to_string());
        repo.divergence = Some(Divergence {
            ahead: 2,
            behind: 0,
        });
        let result = run(
            &dir,
            &RunConfig::default(),
            &repo,
            &ScriptedRunner::new(),
            false,
        );
        assert_eq!(
            result.status_of(CheckId::Branch),
            Some(&CheckStatus::Failed(
                "on branch 'feature', expected 'main'".to_string()
            ))
        );
        assert_eq!(
            result.status_of(CheckId::VcsInSync),
            Some(&CheckStatus::Failed(
                "2 unpushed commit(s) on main".to_string()
            ))
        );
        assert_eq!(result.failed, 2);
        assert_eq!(repo.calls(), vec!["fetch origin".to_string()]);
    }

    #[test]
    fn test_missing_tracking_branch_fails_sync() {
        let dir = default_project();
        let mut repo = MockRepository::new();
        repo.divergence = None;
        let result = run(
            &dir,
            &RunConfig::default(),
            &repo,
            &ScriptedRunner::new(),
            false,
        );
        assert_eq!(
            result.status_of(CheckId::VcsInSync),
            Some(&CheckStatus::Failed("no remote branch origin/main".to_string()))
        );
    }

    #[test]
    fn test_skip_vcs_skips_all_repository_checks() {
        let dir = default_project();
        let mut config = RunConfig::default();
        config.skip.vcs = true;
        let mut repo = MockRepository::new();
        repo.branch = None;
        let result = run(&dir, &config, &repo, &ScriptedRunner::new(), false);

        for id in [CheckId::VcsClean, CheckId::Branch, CheckId::VcsInSync] {
            assert_eq!(
                result.status_of(id),
                Some(&CheckStatus::SkippedByUser("--skip-vcs".to_string()))
            );
        }
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_changelog_check() {
        let dir = project("@version \"1.2.3\"\n", "# Changelog\n\n## 1.2.3 - 2024-01-01\n");
        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &ScriptedRunner::new(),
            false,
        );
        assert_eq!(
            result.status_of(CheckId::Changelog),
            Some(&CheckStatus::Failed(
                "no '## Unreleased' section in CHANGELOG.md".to_string()
            ))
        );

        let result = run(
            &dir,
            &RunConfig::default(),
            &MockRepository::new(),
            &ScriptedRunner::new(),
            true,
        );
        assert_eq!(
            result.status_of(CheckId::Changelog),
            Some(&CheckStatus::NotNeeded(
                "entry supplied with --changelog-entry".to_string()
            ))
        );
    }

    #[test]
    fn test_user_skip_wins_over_supplied_entry() {
        let dir = default_project();
        let mut config = RunConfig::default();
        config.skip.changelog = true;
        let result = run(
            &dir,
            &config,
            &MockRepository::new(),
            &ScriptedRunner::new(),
            true,
        );
        assert_eq!(
            result.status_of(CheckId::Changelog),
            Some(&CheckStatus::SkippedByUser("--skip-changelog".to_string()))
        );
    }

    #[test]
    fn test_package_build_output_scan_is_opt_in() {
        let dir = default_project();
        let noisy = CommandOutput {
            success: true,
            code: Some(0),
            stdout: "Building widget 1.3.0\nerror: missing description".to_string(),
            stderr: String::new(),
        };
        let runner = ScriptedRunner::new().respond("mix hex.build", noisy);

        let mut config = RunConfig::default();
        let result = run(&dir, &config, &MockRepository::new(), &runner, false);
        assert_eq!(
            result.status_of(CheckId::PackageBuild),
            Some(&CheckStatus::Passed)
        );

        config.commands.package_build.scan_output = true;
        let result = run(&dir, &config, &MockRepository::new(), &runner, false);
        assert!(matches!(
            result.status_of(CheckId::PackageBuild),
            Some(CheckStatus::Failed(reason)) if reason.contains("missing description")
        ));
    }
}
