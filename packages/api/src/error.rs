// ABOUTME: Error taxonomy for ICode lifecycle operations
// ABOUTME: Typed failures for validation, fetch, build, registry conflicts, and lookups

use ivm_git::GitError;
use ivm_sandbox::SandboxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed deploy input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Repository clone or authentication failure
    #[error("Failed to fetch repository: {0}")]
    Fetch(#[from] GitError),

    /// Sandbox instantiation failure
    #[error("Failed to build sandbox: {0}")]
    Build(SandboxError),

    /// Sandbox teardown failure
    #[error("Failed to stop sandbox: {0}")]
    Stop(SandboxError),

    /// An instance with this identity is already registered
    #[error("ICode already registered: {0}")]
    Conflict(String),

    /// Unknown or no longer running instance
    #[error("ICode not found: {0}")]
    NotFound(String),
}

/// Type alias for Results that return ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
