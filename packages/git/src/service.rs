// ABOUTME: Repository fetcher contract and its git2-backed implementation
// ABOUTME: Clones sources over SSH with on-disk private keys, cleaning up partial clones

use crate::error::{GitError, Result};
use crate::url::normalize_git_url;
use async_trait::async_trait;
use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Contract for fetching ICode sources into a local directory
///
/// Implementations must not leave a partial clone behind on failure.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Clone `url` into `dest` using the private key at `ssh_key_path`.
    ///
    /// `branch` of `None` selects the remote's default branch. Returns the
    /// local path of the completed clone.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        ssh_key_path: &Path,
        branch: Option<&str>,
    ) -> Result<PathBuf>;
}

/// Production fetcher backed by libgit2
#[derive(Debug, Default)]
pub struct GitRepositoryService;

impl GitRepositoryService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RepositoryFetcher for GitRepositoryService {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        ssh_key_path: &Path,
        branch: Option<&str>,
    ) -> Result<PathBuf> {
        let url = url.to_string();
        let dest = dest.to_path_buf();
        let ssh_key_path = ssh_key_path.to_path_buf();
        let branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        // libgit2 is blocking; keep it off the async workers
        tokio::task::spawn_blocking(move || {
            clone_blocking(&url, &dest, &ssh_key_path, branch.as_deref())
        })
        .await
        .map_err(|e| GitError::Task(e.to_string()))?
    }
}

fn clone_blocking(
    url: &str,
    dest: &Path,
    ssh_key_path: &Path,
    branch: Option<&str>,
) -> Result<PathBuf> {
    let remote = normalize_git_url(url)?;

    if remote.starts_with("git@") || remote.starts_with("ssh://") {
        if !ssh_key_path.exists() {
            return Err(GitError::KeyNotFound(ssh_key_path.display().to_string()));
        }
    }

    debug!("Cloning {} into {}", remote, dest.display());

    let key_path = ssh_key_path.to_path_buf();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, _allowed_types| {
        Cred::ssh_key(username_from_url.unwrap_or("git"), None, &key_path, None)
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    if let Some(branch) = branch {
        builder.branch(branch);
    }

    match builder.clone(&remote, dest) {
        Ok(_) => {
            info!("Cloned {} into {}", remote, dest.display());
            Ok(dest.to_path_buf())
        }
        Err(e) => {
            // Never leave a partial clone on disk
            if dest.exists() {
                if let Err(rm_err) = std::fs::remove_dir_all(dest) {
                    warn!(
                        "Failed to remove partial clone {}: {}",
                        dest.display(),
                        rm_err
                    );
                }
            }
            Err(GitError::Git(e))
        }
    }
}
