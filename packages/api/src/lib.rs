// ABOUTME: ICode orchestration facade wiring registry, fetcher, sandbox provider, and events
// ABOUTME: Public surface for deploy, undeploy, execute, and running-instance queries

mod deploy;
mod dispatch;
pub mod error;
pub mod events;
pub mod registry;
mod teardown;

pub use error::{ApiError, Result};
pub use events::{BroadcastPublisher, EventPublisher, ICodeEvent, NoopPublisher};
pub use registry::{ICodeEntry, ICodeRegistry};

// Re-export the collaborator contracts callers wire in
pub use ivm_core::{ExecutionResult, ICode, ICodeStatus, Request, RequestKind};
pub use ivm_git::{GitRepositoryService, RepositoryFetcher};
pub use ivm_sandbox::{DockerProvider, ProcessProvider, SandboxHandle, SandboxProvider};

use deploy::Deployer;
use dispatch::ExecutionDispatcher;
use std::path::Path;
use std::sync::Arc;
use teardown::TeardownOrchestrator;

/// Control plane for a fleet of sandboxed ICodes
///
/// Owns the instance registry and drives the lifecycle pipelines against the
/// collaborators supplied at construction. All operations are safe under
/// unbounded concurrent callers.
pub struct ICodeApi {
    registry: Arc<ICodeRegistry>,
    deployer: Deployer,
    dispatcher: ExecutionDispatcher,
    teardown: TeardownOrchestrator,
}

impl ICodeApi {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        provider: Arc<dyn SandboxProvider>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let registry = Arc::new(ICodeRegistry::new());

        Self {
            deployer: Deployer::new(
                fetcher,
                Arc::clone(&provider),
                Arc::clone(&registry),
                Arc::clone(&events),
            ),
            dispatcher: ExecutionDispatcher::new(Arc::clone(&registry), Arc::clone(&provider)),
            teardown: TeardownOrchestrator::new(Arc::clone(&registry), provider, events),
            registry,
        }
    }

    /// Fetch `git_url` into `save_path`, start a sandbox, and register the
    /// resulting instance
    pub async fn deploy(
        &self,
        save_path: &Path,
        git_url: &str,
        ssh_key_path: &Path,
        branch: Option<&str>,
    ) -> Result<ICode> {
        self.deployer
            .deploy(save_path, git_url, ssh_key_path, branch)
            .await
    }

    /// Stop a running instance and remove it from the registry
    pub async fn undeploy(&self, id: &str) -> Result<()> {
        self.teardown.undeploy(id).await
    }

    /// Dispatch one request; sandbox-level failures are captured in the result
    pub async fn execute_request(&self, req: &Request) -> Result<ExecutionResult> {
        self.dispatcher.execute_request(req).await
    }

    /// Dispatch a batch; always returns one result per request, in order
    pub async fn execute_request_list(&self, reqs: &[Request]) -> Vec<ExecutionResult> {
        self.dispatcher.execute_request_list(reqs).await
    }

    /// Snapshot of the currently running instances, in registration order
    pub async fn get_running_icode_list(&self) -> Vec<ICode> {
        self.registry.list().await
    }
}
