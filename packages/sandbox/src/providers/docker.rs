// ABOUTME: Container-isolated sandbox backend via bollard
// ABOUTME: Runs each deployed unit in its own Docker container with the source bind-mounted

use super::{parse_output, SandboxHandle, SandboxProvider};
use crate::config::DockerConfig;
use crate::error::{Result, SandboxError};
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
        StopContainerOptions,
    },
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecResults},
    models::HostConfig,
    Docker,
};
use futures::StreamExt;
use ivm_core::RequestKind;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Docker-backed sandbox provider
///
/// One container per deployed unit; the clone is bind-mounted read-only at
/// `/icode` and invocations exec the unit's entrypoint inside the container.
pub struct DockerProvider {
    client: Docker,
    config: DockerConfig,
}

impl DockerProvider {
    /// Connect to the local Docker daemon with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DockerConfig::default())
    }

    /// Connect with explicit settings
    pub fn with_config(config: DockerConfig) -> Result<Self> {
        #[cfg(unix)]
        let client = Docker::connect_with_socket_defaults()?;

        #[cfg(windows)]
        let client = Docker::connect_with_named_pipe_defaults()?;

        Ok(Self { client, config })
    }

    /// Check that the daemon is reachable
    pub async fn is_available(&self) -> bool {
        match self.client.ping().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Docker not available: {}", e);
                false
            }
        }
    }

    fn container_labels(&self, source_path: &Path) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert(format!("{}.managed", self.config.label_prefix), "true".to_string());
        labels.insert(
            format!("{}.source", self.config.label_prefix),
            source_path.display().to_string(),
        );
        labels
    }
}

#[async_trait]
impl SandboxProvider for DockerProvider {
    async fn create(&self, source_path: &Path) -> Result<SandboxHandle> {
        if !source_path.exists() {
            return Err(SandboxError::StartFailed(format!(
                "source path does not exist: {}",
                source_path.display()
            )));
        }

        let container_name = format!(
            "ivm-{}",
            uuid::Uuid::new_v4().to_string().replace('-', "")
        );
        debug!("Creating container {} for {}", container_name, source_path.display());

        let host_config = HostConfig {
            binds: Some(vec![format!("{}:/icode:ro", source_path.display())]),
            memory: Some((self.config.memory_mb * 1024 * 1024) as i64),
            cpu_quota: Some((self.config.cpu_cores * 100_000.0) as i64),
            cpu_period: Some(100_000),
            cap_drop: Some(vec!["ALL".to_string()]),
            privileged: Some(false),
            ..Default::default()
        };

        let config = Config {
            image: Some(self.config.image.clone()),
            // Keep the container alive; invocations arrive via exec
            cmd: Some(vec!["tail".to_string(), "-f".to_string(), "/dev/null".to_string()]),
            labels: Some(self.container_labels(source_path)),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: container_name.clone(),
            platform: None,
        };

        let container = self
            .client
            .create_container(Some(options), config)
            .await
            .map_err(|e| SandboxError::StartFailed(e.to_string()))?;

        if let Err(e) = self
            .client
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
        {
            error!("Failed to start container {}: {}", container.id, e);
            // Drop the half-created container before reporting the failure
            let remove = RemoveContainerOptions {
                force: true,
                v: true,
                ..Default::default()
            };
            if let Err(rm_err) = self.client.remove_container(&container.id, Some(remove)).await {
                warn!("Failed to remove container {}: {}", container.id, rm_err);
            }
            return Err(SandboxError::StartFailed(e.to_string()));
        }

        info!("Started container {} for {}", container.id, source_path.display());
        Ok(SandboxHandle::new(container.id, source_path))
    }

    async fn invoke(
        &self,
        handle: &SandboxHandle,
        function: &str,
        kind: RequestKind,
        args: &[String],
    ) -> Result<serde_json::Value> {
        debug!(
            "Executing {} {} in container {}",
            kind.as_str(),
            function,
            handle.id()
        );

        let mut cmd = vec![
            "/bin/sh".to_string(),
            self.config.entrypoint.clone(),
            kind.as_str().to_string(),
            function.to_string(),
        ];
        cmd.extend(args.iter().cloned());

        let exec_config = CreateExecOptions {
            cmd: Some(cmd),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .client
            .create_exec(handle.id(), exec_config)
            .await
            .map_err(|e| match e {
                BollardError::DockerResponseServerError {
                    status_code: 404, ..
                } => SandboxError::NotFound(handle.id().to_string()),
                _ => SandboxError::Invoke(e.to_string()),
            })?;

        let start_result = self
            .client
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| SandboxError::Invoke(e.to_string()))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        match start_result {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(msg) = output.next().await {
                    match msg {
                        Ok(LogOutput::StdOut { message }) => stdout.extend_from_slice(&message),
                        Ok(LogOutput::StdErr { message }) => stderr.extend_from_slice(&message),
                        Ok(LogOutput::Console { message }) => stdout.extend_from_slice(&message),
                        _ => {}
                    }
                }
            }
            StartExecResults::Detached => {
                return Err(SandboxError::Invoke(
                    "exec was detached unexpectedly".to_string(),
                ));
            }
        }

        let exec_inspect = self
            .client
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| SandboxError::Invoke(e.to_string()))?;

        let exit_code = exec_inspect.exit_code.unwrap_or(0);
        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&stderr);
            let detail = if stderr.trim().is_empty() {
                format!("{} exited with code {}", function, exit_code)
            } else {
                stderr.trim().to_string()
            };
            return Err(SandboxError::Invoke(detail));
        }

        Ok(parse_output(&String::from_utf8_lossy(&stdout)).unwrap_or(serde_json::Value::Null))
    }

    async fn stop(&self, handle: &SandboxHandle) -> Result<()> {
        debug!("Stopping container {}", handle.id());

        let options = StopContainerOptions {
            t: self.config.stop_timeout_secs,
        };

        match self.client.stop_container(handle.id(), Some(options)).await {
            Ok(_) => {}
            // Already stopped or already gone is not an error
            Err(BollardError::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                debug!("Container {} already stopped", handle.id());
            }
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!("Container {} already removed", handle.id());
                return Ok(());
            }
            Err(e) => {
                error!("Failed to stop container {}: {}", handle.id(), e);
                return Err(SandboxError::Docker(e));
            }
        }

        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.client.remove_container(handle.id(), Some(options)).await {
            Ok(_) => {}
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                debug!("Container {} already removed", handle.id());
            }
            Err(e) => {
                error!("Failed to remove container {}: {}", handle.id(), e);
                return Err(SandboxError::Docker(e));
            }
        }

        info!("Removed container {}", handle.id());
        Ok(())
    }
}
