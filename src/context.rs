use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::exec::CommandRunner;
use crate::git::Repository;

/// Everything the checks and steps act on, borrowed for one invocation.
pub struct ReleaseContext<'a> {
    /// Project directory. May be a subdirectory of the repository working tree.
    pub root: &'a Path,
    pub config: &'a RunConfig,
    pub repo: &'a dyn Repository,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ReleaseContext<'a> {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.manifest)
    }

    pub fn readme_path(&self) -> PathBuf {
        self.root.join(&self.config.readme)
    }

    pub fn changelog_path(&self) -> PathBuf {
        self.root.join(&self.config.changelog)
    }

    fn release_files(&self) -> [&'a Path; 3] {
        [
            self.config.manifest.as_path(),
            self.config.readme.as_path(),
            self.config.changelog.as_path(),
        ]
    }

    /// Location of the project directory inside the repository working tree.
    fn repo_prefix(&self) -> PathBuf {
        let Some(workdir) = self.repo.workdir() else {
            return PathBuf::new();
        };
        // Canonical forms, so a symlinked temp dir or a trailing slash still matches.
        let root = fs::canonicalize(self.root).unwrap_or_else(|_| self.root.to_path_buf());
        let workdir = fs::canonicalize(&workdir).unwrap_or(workdir);
        root.strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn repo_relative(&self, prefix: &Path, path: &Path) -> String {
        prefix.join(path).to_string_lossy().replace('\\', "/")
    }

    /// Repository-relative names of the files a release rewrites.
    pub fn version_files(&self) -> Vec<String> {
        let prefix = self.repo_prefix();
        self.release_files()
            .iter()
            .map(|p| self.repo_relative(&prefix, p))
            .collect()
    }

    /// Repository-relative names of the version files that currently exist on disk.
    pub fn existing_version_files(&self) -> Vec<String> {
        let prefix = self.repo_prefix();
        self.release_files()
            .iter()
            .filter(|p| self.root.join(p).exists())
            .map(|p| self.repo_relative(&prefix, p))
            .collect()
    }
}
