// ABOUTME: Provider trait and handle type for sandbox execution backends
// ABOUTME: Defines the create/invoke/stop capability contract implemented per isolation variant

use crate::error::Result;
use async_trait::async_trait;
use ivm_core::RequestKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod docker;
pub mod process;

pub use docker::DockerProvider;
pub use process::ProcessProvider;

/// Opaque reference to a running sandbox environment
///
/// Owned by exactly one registry entry; released exactly once when the
/// instance is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxHandle {
    id: String,
    source_path: PathBuf,
}

impl SandboxHandle {
    pub fn new(id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
        }
    }

    /// Backend-assigned identifier (container id, process sandbox id)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Local source tree the environment was built from
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

/// Capability contract for sandbox runtime backends
///
/// A deployed unit exposes an executable entrypoint (`icode.sh` at the root
/// of its source tree) invoked as `icode.sh <kind> <function> [args...]`.
/// Exit code zero marks success and stdout carries the output payload, parsed
/// as JSON when possible.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Build and start an isolated environment for the unit at `source_path`
    async fn create(&self, source_path: &Path) -> Result<SandboxHandle>;

    /// Invoke a named function inside the environment and return its output
    async fn invoke(
        &self,
        handle: &SandboxHandle,
        function: &str,
        kind: RequestKind,
        args: &[String],
    ) -> Result<serde_json::Value>;

    /// Stop and remove the environment
    ///
    /// Must tolerate an environment that already died; stop is the single
    /// release point for a handle.
    async fn stop(&self, handle: &SandboxHandle) -> Result<()>;
}

/// Parse captured stdout into the invocation output payload
pub(crate) fn parse_output(stdout: &str) -> Option<serde_json::Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::Value::String(trimmed.to_string())),
    }
}
