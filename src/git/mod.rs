//! Version control operations used by the checks and release steps.
//!
//! The controller depends on the [Repository] trait so the pipeline can be
//! exercised without a real repository:
//!
//! - [repository::Git2Repository]: libgit2-backed implementation
//! - [mock::MockRepository]: scripted implementation for tests

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::PathBuf;

use crate::error::Result;

/// How a local branch relates to its remote-tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub ahead: usize,
    pub behind: usize,
}

impl Divergence {
    pub fn in_sync(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

/// Common git operation trait for abstraction
///
/// Read-only methods back the checks; the mutating ones back the release steps.
/// Paths are relative to the repository working directory.
pub trait Repository {
    /// Root of the working tree, or `None` for a bare repository.
    fn workdir(&self) -> Option<PathBuf>;

    /// Paths with uncommitted changes, including untracked files.
    fn dirty_paths(&self) -> Result<Vec<String>>;

    /// Name of the checked-out branch, or `None` when `HEAD` is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Updates remote-tracking branches and tags from `remote`.
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Compares `branch` with `<remote>/<branch>`.
    ///
    /// Returns `None` when the remote-tracking branch does not exist.
    fn divergence(&self, branch: &str, remote: &str) -> Result<Option<Divergence>>;

    /// URL configured for `remote`, if the remote exists.
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    /// Stages `paths` and commits them on `HEAD`.
    ///
    /// Returns `false` without committing when the staged tree equals `HEAD`.
    fn commit_paths(&self, paths: &[String], message: &str) -> Result<bool>;

    /// Creates an annotated tag on `HEAD`.
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Pushes full refspecs (e.g. `refs/heads/main:refs/heads/main`) to `remote`.
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;
}
