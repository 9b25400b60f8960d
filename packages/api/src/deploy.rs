// ABOUTME: Deployment pipeline driving fetch, sandbox instantiation, and registration
// ABOUTME: Every step after the clone has a compensating action so failures leave no trace

use crate::error::{ApiError, Result};
use crate::events::{EventPublisher, ICodeEvent};
use crate::registry::ICodeRegistry;
use chrono::Utc;
use ivm_core::{generate_icode_id, ICode, ICodeStatus};
use ivm_git::{repository_name, RepositoryFetcher};
use ivm_sandbox::SandboxProvider;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) struct Deployer {
    fetcher: Arc<dyn RepositoryFetcher>,
    provider: Arc<dyn SandboxProvider>,
    registry: Arc<ICodeRegistry>,
    events: Arc<dyn EventPublisher>,
}

impl Deployer {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        provider: Arc<dyn SandboxProvider>,
        registry: Arc<ICodeRegistry>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            fetcher,
            provider,
            registry,
            events,
        }
    }

    /// Fetch a repository, start a sandbox from it, and register the instance
    ///
    /// All-or-nothing: a failure at any step undoes every side effect already
    /// performed within this call.
    pub async fn deploy(
        &self,
        save_path: &Path,
        git_url: &str,
        ssh_key_path: &Path,
        branch: Option<&str>,
    ) -> Result<ICode> {
        if save_path.as_os_str().is_empty() {
            return Err(ApiError::Validation("save path must not be empty".to_string()));
        }
        if git_url.trim().is_empty() {
            return Err(ApiError::Validation("git url must not be empty".to_string()));
        }
        if ssh_key_path.as_os_str().is_empty() {
            return Err(ApiError::Validation("ssh key path must not be empty".to_string()));
        }
        let repository_name = repository_name(git_url)
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        // Clone directories are keyed by identity, so redeploying the same
        // URL never collides on the filesystem
        let id = generate_icode_id();
        let dest = save_path.join(&id);

        let path = self
            .fetcher
            .fetch(git_url, &dest, ssh_key_path, branch)
            .await?;

        let handle = match self.provider.create(&path).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to build sandbox for {}: {}", git_url, e);
                remove_source_tree(&path).await;
                return Err(ApiError::Build(e));
            }
        };

        let icode = ICode {
            id: id.clone(),
            repository_name,
            git_url: git_url.to_string(),
            path: path.display().to_string(),
            status: ICodeStatus::Running,
            deployed_at: Utc::now(),
        };

        if let Err(e) = self.registry.register(icode.clone(), handle.clone()).await {
            // Unreachable with fresh identities, but the sandbox must not
            // outlive a failed registration
            error!("Registration conflict for {}: {}", id, e);
            if let Err(stop_err) = self.provider.stop(&handle).await {
                error!("Failed to stop sandbox during rollback: {}", stop_err);
            }
            remove_source_tree(&path).await;
            return Err(e);
        }

        self.events.publish(&ICodeEvent::Deployed {
            id: icode.id.clone(),
            repository_name: icode.repository_name.clone(),
            git_url: icode.git_url.clone(),
        });

        info!("Deployed icode {} from {}", icode.id, icode.git_url);
        Ok(icode)
    }
}

/// Best-effort removal of a cloned source tree
pub(crate) async fn remove_source_tree(path: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        if path.exists() {
            warn!("Failed to remove source tree {}: {}", path.display(), e);
        }
    }
}
