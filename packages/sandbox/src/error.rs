// ABOUTME: Error types for sandbox lifecycle and invocation
// ABOUTME: Wraps Docker failures and reports start/invoke problems per backend

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    /// Docker daemon or API failure
    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// The referenced sandbox does not exist on the backend
    #[error("Sandbox not found: {0}")]
    NotFound(String),

    /// The environment could not be built or started from the source tree
    #[error("Sandbox failed to start: {0}")]
    StartFailed(String),

    /// The deployed unit has no runnable entrypoint
    #[error("Entrypoint not found: {0}")]
    EntrypointNotFound(String),

    /// A function invocation inside the sandbox failed
    #[error("Invocation failed: {0}")]
    Invoke(String),

    /// Filesystem failure while inspecting the source tree
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
