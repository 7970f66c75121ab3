//! The fixed sequence of release actions.

use chrono::NaiveDate;
use std::fs;

use crate::changelog;
use crate::context::ReleaseContext;
use crate::pipeline::{StepOutcome, StepSpec};

/// CLI used to create hosted releases.
pub const HOSTED_RELEASE_CLI: &str = "gh";

/// Tag name for a release version.
pub fn tag_name(version: &str) -> String {
    format!("v{}", version)
}

/// Whether a remote URL points at GitHub (SSH or HTTPS form).
pub fn is_github_remote(url: &str) -> bool {
    url.contains("github.com")
}

fn outcome<T>(result: crate::Result<T>) -> StepOutcome {
    match result {
        Ok(_) => StepOutcome::Done,
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

/// Builds the release steps in run order.
pub fn release_steps<'a>(
    ctx: &'a ReleaseContext<'a>,
    version: &'a str,
    today: NaiveDate,
) -> Vec<StepSpec<'a>> {
    let tag = tag_name(version);
    let message = format!("Release {}", tag);
    let skip = ctx.config.skip;

    vec![
        StepSpec::new(
            format!("Update {} for {}", ctx.config.changelog.display(), version),
            skip.changelog.then(|| "--skip-changelog".to_string()),
            move || outcome(changelog::stamp_release(&ctx.changelog_path(), version, today)),
        ),
        StepSpec::new("Commit version files", None, {
            let message = message.clone();
            move || commit(ctx, &message)
        }),
        StepSpec::new(format!("Create tag {}", tag), None, {
            let tag = tag.clone();
            move || outcome(ctx.repo.create_annotated_tag(&tag, &message))
        }),
        StepSpec::new(format!("Push to {}", ctx.config.remote), None, {
            let tag = tag.clone();
            move || push(ctx, &tag)
        }),
        StepSpec::new(
            "Create GitHub release",
            skip.hosted_release.then(|| "--skip-hosted-release".to_string()),
            {
                let tag = tag.clone();
                move || hosted_release(ctx, version, &tag)
            },
        ),
        StepSpec::new("Publish package", None, move || publish(ctx)),
    ]
}

fn commit(ctx: &ReleaseContext<'_>, message: &str) -> StepOutcome {
    let files = ctx.existing_version_files();
    match ctx.repo.commit_paths(&files, message) {
        Ok(true) => StepOutcome::Done,
        Ok(false) => StepOutcome::Skipped("nothing to commit".to_string()),
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

fn push(ctx: &ReleaseContext<'_>, tag: &str) -> StepOutcome {
    let branch = &ctx.config.branch;
    let refspecs = vec![
        format!("refs/heads/{}:refs/heads/{}", branch, branch),
        format!("refs/tags/{}:refs/tags/{}", tag, tag),
    ];
    outcome(ctx.repo.push(&ctx.config.remote, &refspecs))
}

fn hosted_release(ctx: &ReleaseContext<'_>, version: &str, tag: &str) -> StepOutcome {
    if !ctx.runner.is_available(HOSTED_RELEASE_CLI) {
        return StepOutcome::Skipped(format!("{} is not installed", HOSTED_RELEASE_CLI));
    }

    let remote = &ctx.config.remote;
    match ctx.repo.remote_url(remote) {
        Ok(Some(url)) if is_github_remote(&url) => {}
        Ok(_) => return StepOutcome::Skipped(format!("{} is not hosted on GitHub", remote)),
        Err(e) => return StepOutcome::Failed(e.to_string()),
    }

    let notes = fs::read_to_string(ctx.changelog_path())
        .ok()
        .and_then(|contents| changelog::release_notes(&contents, version));

    let mut args: Vec<String> = ["release", "create", tag, "--title", tag]
        .iter()
        .map(|a| a.to_string())
        .collect();
    match notes {
        Some(notes) => {
            args.push("--notes".to_string());
            args.push(notes);
        }
        None => args.push("--generate-notes".to_string()),
    }

    match ctx.runner.run(HOSTED_RELEASE_CLI, &args) {
        Ok(output) if output.success => StepOutcome::Done,
        Ok(output) => StepOutcome::Failed(
            output.failure_reason(&format!("{} release create {}", HOSTED_RELEASE_CLI, tag)),
        ),
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

fn publish(ctx: &ReleaseContext<'_>) -> StepOutcome {
    let command = &ctx.config.commands.publish;
    match ctx.runner.run_interactive(&command.program, &command.args) {
        Ok(true) => StepOutcome::Done,
        Ok(false) => StepOutcome::Failed(format!("`{}` failed", command.display())),
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}
