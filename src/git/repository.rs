use git2::{
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, StatusOptions,
};
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::git::Divergence;

/// A rejected credential makes libgit2 ask again; stop after this many tries.
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }
}

/// Authentication callbacks shared by fetch and push.
///
/// Tries SSH keys from `~/.ssh`, then the SSH agent, then git credential helpers.
fn remote_callbacks(config: &git2::Config) -> RemoteCallbacks<'_> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }

        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                let keys = ["id_ed25519", "id_rsa", "id_ecdsa"];
                // Each retry moves on to the next key before falling back to the agent.
                if let Some(key) = keys
                    .iter()
                    .map(|k| home.join(".ssh").join(k))
                    .filter(|p| p.exists())
                    .nth(attempts - 1)
                {
                    return Cred::ssh_key(username, None, &key, None);
                }
            }
            return Cred::ssh_key_from_agent(username);
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return Cred::credential_helper(config, url, username_from_url);
        }

        Cred::default()
    });

    callbacks
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status() != git2::Status::CURRENT)
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }

    fn fetch(&self, remote_name: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name)?;
        let config = self.repo.config()?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(&config));

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        log::debug!("fetching {:?} from {}", refspecs, remote_name);
        remote.fetch(&refspecs, Some(&mut fetch_options), None)?;
        Ok(())
    }

    fn divergence(&self, branch: &str, remote: &str) -> Result<Option<Divergence>> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .get()
            .target()
            .ok_or_else(|| git2::Error::from_str(&format!("branch '{}' has no target", branch)))?;

        let tracking = format!("refs/remotes/{}/{}", remote, branch);
        let upstream = match self.repo.find_reference(&tracking) {
            Ok(reference) => reference.target(),
            Err(e) if e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let Some(upstream) = upstream else {
            return Ok(None);
        };

        let (ahead, behind) = self.repo.graph_ahead_behind(local, upstream)?;
        Ok(Some(Divergence { ahead, behind }))
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo.find_remote(remote) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commit_paths(&self, paths: &[String], message: &str) -> Result<bool> {
        let parent = self.repo.head()?.peel_to_commit()?;

        let mut index = self.repo.index()?;
        for path in paths {
            log::debug!("staging {}", path);
            index.add_path(Path::new(path))?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        if tree_id == parent.tree_id() {
            return Ok(false);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        log::debug!("created commit {}", oid);
        Ok(true)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        let signature = self.repo.signature()?;
        self.repo
            .tag(name, head.as_object(), &signature, message, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    ReleaseError::file(format!("tag '{}' already exists", name))
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    fn push(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name)?;
        let config = self.repo.config()?;

        let mut callbacks = remote_callbacks(&config);
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        log::debug!("pushing {:?} to {}", refspecs, remote_name);
        remote.push(refspecs, Some(&mut push_options))?;
        Ok(())
    }
}
