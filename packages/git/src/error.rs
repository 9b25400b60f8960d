// ABOUTME: Error types for git repository fetching
// ABOUTME: Wraps libgit2 failures and invalid input reported during clone

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    /// Underlying libgit2 failure (network, authentication, object store)
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// The source URL could not be parsed into a cloneable remote
    #[error("Invalid repository url: {0}")]
    InvalidUrl(String),

    /// The private key file for SSH authentication is missing
    #[error("SSH key not found: {0}")]
    KeyNotFound(String),

    /// Filesystem failure while preparing or cleaning the clone directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking clone task was cancelled or panicked
    #[error("Clone task failed: {0}")]
    Task(String),
}

/// Type alias for Results that return GitError
pub type Result<T> = std::result::Result<T, GitError>;
