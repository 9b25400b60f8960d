// ABOUTME: Configuration for the Docker sandbox backend
// ABOUTME: Defaults with environment variable overrides for image and resource limits

use std::env;

/// Settings for [`crate::DockerProvider`]
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Image the sandbox containers run
    pub image: String,
    /// Grace period before a stop escalates to SIGKILL
    pub stop_timeout_secs: i64,
    /// Memory limit per sandbox in megabytes
    pub memory_mb: u64,
    /// CPU cores per sandbox (fractional allowed)
    pub cpu_cores: f64,
    /// Label prefix applied to managed containers
    pub label_prefix: String,
    /// Entrypoint path of the deployed unit inside the container
    pub entrypoint: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            image: "alpine:latest".to_string(),
            stop_timeout_secs: 10,
            memory_mb: 512,
            cpu_cores: 1.0,
            label_prefix: "ivm".to_string(),
            entrypoint: "/icode/icode.sh".to_string(),
        }
    }
}

impl DockerConfig {
    /// Build settings from the environment, falling back to defaults
    ///
    /// Recognized variables: `IVM_SANDBOX_IMAGE`, `IVM_SANDBOX_STOP_TIMEOUT`,
    /// `IVM_SANDBOX_MEMORY_MB`, `IVM_SANDBOX_CPU_CORES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            image: env::var("IVM_SANDBOX_IMAGE").unwrap_or(defaults.image),
            stop_timeout_secs: env::var("IVM_SANDBOX_STOP_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stop_timeout_secs),
            memory_mb: env::var("IVM_SANDBOX_MEMORY_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_mb),
            cpu_cores: env::var("IVM_SANDBOX_CPU_CORES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cpu_cores),
            label_prefix: defaults.label_prefix,
            entrypoint: defaults.entrypoint,
        }
    }
}
