use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cut_release::cli::ReleaseController;
use cut_release::config::{self, CliOverrides, RunConfig};
use cut_release::context::ReleaseContext;
use cut_release::exec::SystemRunner;
use cut_release::git::Git2Repository;
use cut_release::pipeline::{Reporter, StepOutcome};
use cut_release::ui::{self, ConsoleReporter};
use cut_release::ReleaseError;

#[derive(clap::Parser)]
#[command(
    name = "cut-release",
    version,
    about = "Check, tag and publish a package release"
)]
struct Args {
    #[arg(
        value_name = "VERSION",
        help = "major, minor, patch, current, or an explicit MAJOR.MINOR.PATCH"
    )]
    target: String,

    #[arg(long, help = "Run every check but change nothing")]
    dry_run: bool,

    #[arg(long, help = "Skip the test suite")]
    skip_tests: bool,

    #[arg(long, help = "Skip the formatting check")]
    skip_format: bool,

    #[arg(long, help = "Skip the lint check")]
    skip_lint: bool,

    #[arg(long, help = "Skip the type check")]
    skip_typecheck: bool,

    #[arg(long, help = "Skip the changelog check and stamping")]
    skip_changelog: bool,

    #[arg(long, help = "Skip the clean, branch and in-sync checks")]
    skip_vcs: bool,

    #[arg(long, help = "Skip the package build check")]
    skip_package_dry_run: bool,

    #[arg(long, help = "Do not create a hosted release")]
    skip_hosted_release: bool,

    #[arg(short, long, help = "Branch releases are cut from")]
    branch: Option<String>,

    #[arg(long, help = "Remote to check against and push to")]
    remote: Option<String>,

    #[arg(long, value_name = "TEXT", help = "Add an entry to the unreleased changelog section")]
    changelog_entry: Option<String>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print debug logging")]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            branch: self.branch.clone(),
            remote: self.remote.clone(),
            changelog_entry: self.changelog_entry.clone(),
            dry_run: self.dry_run,
            skip_tests: self.skip_tests,
            skip_format: self.skip_format,
            skip_lint: self.skip_lint,
            skip_typecheck: self.skip_typecheck,
            skip_changelog: self.skip_changelog,
            skip_vcs: self.skip_vcs,
            skip_package_dry_run: self.skip_package_dry_run,
            skip_hosted_release: self.skip_hosted_release,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        ui::display_error(&format!("{:#}", e));
        let code = e
            .downcast_ref::<ReleaseError>()
            .map(ReleaseError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(args: &Args) -> Result<()> {
    let persisted = config::load_config(args.config.as_deref())?;
    let run_config = RunConfig::merge(&persisted, &args.overrides());

    let root = std::env::current_dir().context("cannot determine working directory")?;
    let repo = Git2Repository::open(&root).context("not inside a git repository")?;
    let runner = SystemRunner::new(&root);
    let today = chrono::Local::now().date_naive();

    let ctx = ReleaseContext {
        root: &root,
        config: &run_config,
        repo: &repo,
        runner: &runner,
    };
    let mut reporter = ConsoleReporter::new();
    let summary = ReleaseController::new(ctx, &mut reporter, today).run(&args.target)?;

    if summary.is_dry_run() {
        ui::display_success(&format!("Dry run finished for {}", summary.tag()));
        return Ok(());
    }

    let skipped = summary
        .steps
        .iter()
        .filter(|s| matches!(s.outcome, StepOutcome::Skipped(_)))
        .count();
    if skipped > 0 {
        reporter.status(&format!("{} release step(s) skipped", skipped));
    }
    ui::display_success(&format!("Released {}", summary.tag()));
    Ok(())
}
