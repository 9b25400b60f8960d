// ABOUTME: Git integration for fetching ICode sources from remote repositories
// ABOUTME: Clones over SSH with key-based authentication and parses repository URLs

pub mod error;
pub mod service;
pub mod url;

pub use error::{GitError, Result};
pub use service::{GitRepositoryService, RepositoryFetcher};
pub use url::{normalize_git_url, repository_name};
