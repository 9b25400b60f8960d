// ABOUTME: Child-process sandbox backend for hosts without a container runtime
// ABOUTME: Spawns the deployed unit's entrypoint per invocation with the clone as working directory

use super::{parse_output, SandboxHandle, SandboxProvider};
use crate::error::{Result, SandboxError};
use async_trait::async_trait;
use ivm_core::RequestKind;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

const DEFAULT_ENTRYPOINT: &str = "icode.sh";

/// Process-isolated sandbox provider
///
/// No long-lived environment: each invocation spawns the unit's entrypoint as
/// a child process. Weaker isolation than [`super::DockerProvider`], but it
/// runs anywhere a shell does.
#[derive(Debug, Clone)]
pub struct ProcessProvider {
    entrypoint: String,
}

impl Default for ProcessProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProvider {
    pub fn new() -> Self {
        Self {
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
        }
    }

    /// Use an entrypoint file name other than `icode.sh`
    pub fn with_entrypoint(entrypoint: impl Into<String>) -> Self {
        Self {
            entrypoint: entrypoint.into(),
        }
    }
}

#[async_trait]
impl SandboxProvider for ProcessProvider {
    async fn create(&self, source_path: &Path) -> Result<SandboxHandle> {
        let entrypoint = source_path.join(&self.entrypoint);
        if !entrypoint.is_file() {
            return Err(SandboxError::EntrypointNotFound(
                entrypoint.display().to_string(),
            ));
        }

        let id = format!("proc_{}", uuid::Uuid::new_v4().to_string().replace('-', ""));
        info!("Created process sandbox {} for {}", id, source_path.display());
        Ok(SandboxHandle::new(id, source_path))
    }

    async fn invoke(
        &self,
        handle: &SandboxHandle,
        function: &str,
        kind: RequestKind,
        args: &[String],
    ) -> Result<serde_json::Value> {
        let entrypoint = handle.source_path().join(&self.entrypoint);
        if !entrypoint.is_file() {
            return Err(SandboxError::NotFound(handle.id().to_string()));
        }

        debug!(
            "Executing {} {} in process sandbox {}",
            kind.as_str(),
            function,
            handle.id()
        );

        let output = Command::new("sh")
            .arg(&entrypoint)
            .arg(kind.as_str())
            .arg(function)
            .args(args)
            .current_dir(handle.source_path())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                format!(
                    "{} exited with code {}",
                    function,
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stderr.trim().to_string()
            };
            return Err(SandboxError::Invoke(detail));
        }

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout)).unwrap_or(serde_json::Value::Null))
    }

    async fn stop(&self, handle: &SandboxHandle) -> Result<()> {
        // Nothing persistent to release; invocations are per-process
        debug!("Stopped process sandbox {}", handle.id());
        Ok(())
    }
}
