// ABOUTME: Repository URL parsing and normalization
// ABOUTME: Derives repository names and rewrites scheme-less URLs into cloneable remotes

use crate::error::{GitError, Result};
use std::path::Path;

/// Derive the repository name from the final path segment of a source URL
///
/// Works for scheme-less (`github.com/owner/repo`), SSH
/// (`git@github.com:owner/repo.git`), and HTTPS forms.
pub fn repository_name(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let name = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default()
        .to_string();

    if name.is_empty() || name.contains('@') || (name.contains('.') && !trimmed.contains('/')) {
        return Err(GitError::InvalidUrl(url.to_string()));
    }

    Ok(name)
}

/// Rewrite a source URL into a form git can clone
///
/// Handles the URL formats deployments arrive with:
/// - `git@github.com:owner/repo.git` — passed through
/// - `https://github.com/owner/repo.git`, `ssh://...`, `file://...` — passed through
/// - local paths — passed through (used by tests and local deployments)
/// - `github.com/owner/repo` — rewritten to `git@github.com:owner/repo`
pub fn normalize_git_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(GitError::InvalidUrl(url.to_string()));
    }

    if url.starts_with("git@") || url.contains("://") {
        return Ok(url.to_string());
    }

    if Path::new(url).exists() {
        return Ok(url.to_string());
    }

    // Scheme-less remote form: first segment must look like a host
    let (host, rest) = url
        .split_once('/')
        .ok_or_else(|| GitError::InvalidUrl(url.to_string()))?;
    if !host.contains('.') || rest.is_empty() {
        return Err(GitError::InvalidUrl(url.to_string()));
    }

    Ok(format!("git@{}:{}", host, rest))
}
