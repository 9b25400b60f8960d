// ABOUTME: Teardown pipeline stopping a sandbox and retiring its registry entry
// ABOUTME: Drains in-flight calls, releases the handle exactly once, and cleans the source tree

use crate::deploy::remove_source_tree;
use crate::error::{ApiError, Result};
use crate::events::{EventPublisher, ICodeEvent};
use crate::registry::ICodeRegistry;
use ivm_core::ICodeStatus;
use ivm_sandbox::SandboxProvider;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub(crate) struct TeardownOrchestrator {
    registry: Arc<ICodeRegistry>,
    provider: Arc<dyn SandboxProvider>,
    events: Arc<dyn EventPublisher>,
}

impl TeardownOrchestrator {
    pub fn new(
        registry: Arc<ICodeRegistry>,
        provider: Arc<dyn SandboxProvider>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            registry,
            provider,
            events,
        }
    }

    /// Stop an instance's sandbox and remove it from the registry
    ///
    /// Exactly one of several racing callers wins the `Running -> Stopping`
    /// transition and performs the teardown; the rest observe `NotFound`.
    pub async fn undeploy(&self, id: &str) -> Result<()> {
        if !self
            .registry
            .transition(id, ICodeStatus::Running, ICodeStatus::Stopping)
            .await
        {
            return Err(ApiError::NotFound(id.to_string()));
        }

        let entry = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        // Drain the in-flight call before the sandbox goes away; new
        // dispatches are already rejected by the Stopping status
        let _guard = entry.gate.lock().await;

        if let Err(e) = self.provider.stop(&entry.handle).await {
            error!("Failed to stop sandbox for {}: {}", id, e);
            // Compensate: the sandbox is still live, make the instance
            // dispatchable again
            self.registry
                .transition(id, ICodeStatus::Stopping, ICodeStatus::Running)
                .await;
            return Err(ApiError::Stop(e));
        }

        self.registry.unregister(id).await;
        remove_source_tree(Path::new(&entry.icode.path)).await;

        self.events.publish(&ICodeEvent::Undeployed { id: id.to_string() });

        info!("Undeployed icode {}", id);
        Ok(())
    }
}
