// tests/integration_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn cut_release(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cut-release"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn mix_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    fs::write(dir.path().join("cutrelease.toml"), "").unwrap();
    fs::write(dir.path().join("mix.exs"), "@version \"1.2.3\"\n").unwrap();
    dir
}

#[test]
fn test_cut_release_help() {
    let dir = TempDir::new().unwrap();
    let output = cut_release(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("cut-release"));
    assert!(stdout.contains("--skip-hosted-release"));
    assert!(stdout.contains("--changelog-entry"));
}

#[test]
fn test_cut_release_version() {
    let dir = TempDir::new().unwrap();
    let output = cut_release(dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_version_argument_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = cut_release(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("cutrelease.toml"), "").unwrap();
    let output = cut_release(dir.path(), &["patch"]);

    assert_eq!(output.status.code(), Some(9));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("not inside a git repository"));
}

#[test]
fn test_malformed_version_exits_before_any_check() {
    let dir = mix_project();
    let output = cut_release(dir.path(), &["1.2"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid version '1.2'"));
    assert_eq!(
        fs::read_to_string(dir.path().join("mix.exs")).unwrap(),
        "@version \"1.2.3\"\n"
    );
}

#[test]
fn test_older_version_is_rejected() {
    let dir = mix_project();
    let output = cut_release(dir.path(), &["1.0.0"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_empty_changelog_entry_is_usage_error() {
    let dir = mix_project();
    let output = cut_release(dir.path(), &["patch", "--changelog-entry", "  "]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_manifest_is_file_error() {
    let dir = mix_project();
    fs::remove_file(dir.path().join("mix.exs")).unwrap();
    let output = cut_release(dir.path(), &["patch"]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_unreadable_config_is_config_error() {
    let dir = mix_project();
    fs::write(dir.path().join("cutrelease.toml"), "branch = [").unwrap();
    let output = cut_release(dir.path(), &["patch"]);
    assert_eq!(output.status.code(), Some(6));
}
