use std::cell::RefCell;
use std::path::PathBuf;

use crate::error::{ReleaseError, Result};
use crate::git::{Divergence, Repository};

/// Mock repository for testing without actual git operations
///
/// Mutating calls are recorded in order and can be made to fail by name
/// (`"fetch"`, `"commit"`, `"tag"`, `"push"`).
pub struct MockRepository {
    pub dirty: Vec<String>,
    pub branch: Option<String>,
    pub divergence: Option<Divergence>,
    pub remote_url: Option<String>,
    /// `None` means paths are already relative to the project directory.
    pub workdir: Option<PathBuf>,
    pub failing: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl MockRepository {
    /// A clean repository on `main`, in sync with a GitHub remote.
    pub fn new() -> Self {
        MockRepository {
            dirty: Vec::new(),
            branch: Some("main".to_string()),
            divergence: Some(Divergence {
                ahead: 0,
                behind: 0,
            }),
            remote_url: Some("git@github.com:acme/widget.git".to_string()),
            workdir: None,
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Make the named operation return an error.
    pub fn fail_on(mut self, operation: &'static str) -> Self {
        self.failing.push(operation);
        self
    }

    /// Operations performed so far, e.g. `"tag v1.2.0"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("{} {}", operation, detail).trim_end().to_string());
        if self.failing.contains(&operation) {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "{} failed",
                operation
            ))));
        }
        Ok(())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Option<PathBuf> {
        self.workdir.clone()
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record("fetch", remote.to_string())
    }

    fn divergence(&self, _branch: &str, _remote: &str) -> Result<Option<Divergence>> {
        Ok(self.divergence)
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.remote_url.clone())
    }

    fn commit_paths(&self, paths: &[String], _message: &str) -> Result<bool> {
        self.record("commit", paths.join(","))?;
        Ok(true)
    }

    fn create_annotated_tag(&self, name: &str, _message: &str) -> Result<()> {
        self.record("tag", name.to_string())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        self.record("push", format!("{} {}", remote, refspecs.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_defaults() {
        let repo = MockRepository::default();
        assert!(repo.dirty_paths().unwrap().is_empty());
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
        assert!(repo.divergence("main", "origin").unwrap().unwrap().in_sync());
    }

    #[test]
    fn test_mock_repository_records_calls() {
        let repo = MockRepository::new();
        repo.create_annotated_tag("v1.0.0", "Release v1.0.0").unwrap();
        repo.push("origin", &["refs/tags/v1.0.0".to_string()])
            .unwrap();
        assert_eq!(
            repo.calls(),
            vec![
                "tag v1.0.0".to_string(),
                "push origin refs/tags/v1.0.0".to_string()
            ]
        );
    }

    #[test]
    fn test_mock_repository_failure() {
        let repo = MockRepository::new().fail_on("push");
        assert!(repo.push("origin", &[]).is_err());
        assert_eq!(repo.calls(), vec!["push origin".to_string()]);
    }
}
