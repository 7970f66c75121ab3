use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// File name looked up in the working directory and the user config directory.
pub const CONFIG_FILE_NAME: &str = "cutrelease.toml";

/// Persisted defaults for cut-release.
///
/// Every key mirrors a command-line flag; flags given on the command line win.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    #[serde(default = "default_readme")]
    pub readme: PathBuf,

    #[serde(default = "default_changelog")]
    pub changelog: PathBuf,

    #[serde(default)]
    pub changelog_entry: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub skip_tests: bool,

    #[serde(default)]
    pub skip_format: bool,

    #[serde(default)]
    pub skip_lint: bool,

    #[serde(default)]
    pub skip_typecheck: bool,

    #[serde(default)]
    pub skip_changelog: bool,

    #[serde(default)]
    pub skip_vcs: bool,

    #[serde(default)]
    pub skip_package_dry_run: bool,

    #[serde(default)]
    pub skip_hosted_release: bool,

    #[serde(default)]
    pub commands: CommandsConfig,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("mix.exs")
}

fn default_readme() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_changelog() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            branch: default_branch(),
            remote: default_remote(),
            manifest: default_manifest(),
            readme: default_readme(),
            changelog: default_changelog(),
            changelog_entry: None,
            dry_run: false,
            skip_tests: false,
            skip_format: false,
            skip_lint: false,
            skip_typecheck: false,
            skip_changelog: false,
            skip_vcs: false,
            skip_package_dry_run: false,
            skip_hosted_release: false,
            commands: CommandsConfig::default(),
        }
    }
}

/// An external tool invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommandConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Text that must appear in the manifest for the tool to be considered installed.
    #[serde(default)]
    pub requires: Option<String>,

    /// Also fail a successful run whose output reports errors.
    #[serde(default)]
    pub scan_output: bool,
}

impl CommandConfig {
    fn new(program: &str, args: &[&str]) -> Self {
        CommandConfig {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            requires: None,
            scan_output: false,
        }
    }

    fn requiring(mut self, text: &str) -> Self {
        self.requires = Some(text.to_string());
        self
    }

    /// The command line as typed in a shell, for messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn default_tests_command() -> CommandConfig {
    CommandConfig::new("mix", &["test"])
}

fn default_format_command() -> CommandConfig {
    CommandConfig::new("mix", &["format", "--check-formatted"])
}

fn default_lint_command() -> CommandConfig {
    CommandConfig::new("mix", &["credo", "--strict"]).requiring(":credo")
}

fn default_typecheck_command() -> CommandConfig {
    CommandConfig::new("mix", &["dialyzer"]).requiring(":dialyxir")
}

fn default_package_build_command() -> CommandConfig {
    CommandConfig::new("mix", &["hex.build"])
}

fn default_publish_command() -> CommandConfig {
    CommandConfig::new("mix", &["hex.publish"])
}

/// External tools used by the checks and the publish step.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommandsConfig {
    #[serde(default = "default_tests_command")]
    pub tests: CommandConfig,

    #[serde(default = "default_format_command")]
    pub format: CommandConfig,

    #[serde(default = "default_lint_command")]
    pub lint: CommandConfig,

    #[serde(default = "default_typecheck_command")]
    pub typecheck: CommandConfig,

    #[serde(default = "default_package_build_command")]
    pub package_build: CommandConfig,

    #[serde(default = "default_publish_command")]
    pub publish: CommandConfig,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        CommandsConfig {
            tests: default_tests_command(),
            format: default_format_command(),
            lint: default_lint_command(),
            typecheck: default_typecheck_command(),
            package_build: default_package_build_command(),
            publish: default_publish_command(),
        }
    }
}

/// Values taken from the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub branch: Option<String>,
    pub remote: Option<String>,
    pub changelog_entry: Option<String>,
    pub dry_run: bool,
    pub skip_tests: bool,
    pub skip_format: bool,
    pub skip_lint: bool,
    pub skip_typecheck: bool,
    pub skip_changelog: bool,
    pub skip_vcs: bool,
    pub skip_package_dry_run: bool,
    pub skip_hosted_release: bool,
}

/// Per-check and per-step skip switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
    pub tests: bool,
    pub format: bool,
    pub lint: bool,
    pub typecheck: bool,
    pub changelog: bool,
    pub vcs: bool,
    pub package_dry_run: bool,
    pub hosted_release: bool,
}

/// The effective settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub branch: String,
    pub remote: String,
    pub manifest: PathBuf,
    pub readme: PathBuf,
    pub changelog: PathBuf,
    pub changelog_entry: Option<String>,
    pub dry_run: bool,
    pub skip: SkipFlags,
    pub commands: CommandsConfig,
}

impl RunConfig {
    /// Layers command-line values over the persisted configuration, field by field.
    pub fn merge(config: &Config, cli: &CliOverrides) -> Self {
        RunConfig {
            branch: cli.branch.clone().unwrap_or_else(|| config.branch.clone()),
            remote: cli.remote.clone().unwrap_or_else(|| config.remote.clone()),
            manifest: config.manifest.clone(),
            readme: config.readme.clone(),
            changelog: config.changelog.clone(),
            changelog_entry: cli
                .changelog_entry
                .clone()
                .or_else(|| config.changelog_entry.clone()),
            dry_run: cli.dry_run || config.dry_run,
            skip: SkipFlags {
                tests: cli.skip_tests || config.skip_tests,
                format: cli.skip_format || config.skip_format,
                lint: cli.skip_lint || config.skip_lint,
                typecheck: cli.skip_typecheck || config.skip_typecheck,
                changelog: cli.skip_changelog || config.skip_changelog,
                vcs: cli.skip_vcs || config.skip_vcs,
                package_dry_run: cli.skip_package_dry_run || config.skip_package_dry_run,
                hosted_release: cli.skip_hosted_release || config.skip_hosted_release,
            },
            commands: config.commands.clone(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig::merge(&Config::default(), &CliOverrides::default())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `cutrelease.toml` in current directory
/// 3. `cutrelease.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or a custom path is missing
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            candidate
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    log::debug!("loading configuration from {}", path.display());
    let contents = fs::read_to_string(&path)
        .map_err(|e| ReleaseError::config(format!("cannot read {}: {}", path.display(), e)))?;
    parse_config(&contents)
        .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))
}

/// Parses configuration text, filling every missing key with its default.
pub fn parse_config(contents: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.branch, "main");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.manifest, PathBuf::from("mix.exs"));
        assert!(!config.skip_tests);
        assert_eq!(config.commands.tests.display(), "mix test");
        assert_eq!(config.commands.lint.requires.as_deref(), Some(":credo"));
    }

    #[test]
    fn test_empty_file_equals_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_command_table() {
        let config = parse_config(
            r#"
[commands.tests]
program = "make"
args = ["check"]
"#,
        )
        .unwrap();
        assert_eq!(config.commands.tests.display(), "make check");
        assert_eq!(config.commands.format, default_format_command());
    }

    #[test]
    fn test_cli_flags_win_and_absent_flags_keep_persisted_values() {
        let config = parse_config(
            r#"
branch = "main"
skip_tests = true
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            skip_format: true,
            ..CliOverrides::default()
        };

        let run = RunConfig::merge(&config, &cli);
        assert!(run.skip.tests);
        assert!(run.skip.format);
        assert!(!run.skip.lint);
        assert_eq!(run.branch, "main");
    }

    #[test]
    fn test_cli_branch_and_entry_override() {
        let config = parse_config(
            r#"
branch = "develop"
changelog_entry = "from config"
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            branch: Some("release".to_string()),
            changelog_entry: Some("from cli".to_string()),
            ..CliOverrides::default()
        };

        let run = RunConfig::merge(&config, &cli);
        assert_eq!(run.branch, "release");
        assert_eq!(run.changelog_entry.as_deref(), Some("from cli"));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(parse_config("branch = [").is_err());
    }
}
