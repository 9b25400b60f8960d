// ABOUTME: Sandbox runtime backends for running deployed ICodes in isolation
// ABOUTME: Provides the provider capability contract plus Docker and child-process backends

pub mod config;
pub mod error;
pub mod providers;

pub use config::DockerConfig;
pub use error::{Result, SandboxError};
pub use providers::{DockerProvider, ProcessProvider, SandboxHandle, SandboxProvider};
