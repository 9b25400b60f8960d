// ABOUTME: Routes invoke/query requests into running sandboxes
// ABOUTME: Serializes per-instance calls, runs cross-instance batches concurrently, errors as values

use crate::error::{ApiError, Result};
use crate::registry::ICodeRegistry;
use futures::future::join_all;
use ivm_core::{ExecutionResult, ICodeStatus, Request};
use ivm_sandbox::SandboxProvider;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct ExecutionDispatcher {
    registry: Arc<ICodeRegistry>,
    provider: Arc<dyn SandboxProvider>,
}

impl ExecutionDispatcher {
    pub fn new(registry: Arc<ICodeRegistry>, provider: Arc<dyn SandboxProvider>) -> Self {
        Self { registry, provider }
    }

    /// Dispatch one request into its instance's sandbox
    ///
    /// An unknown or stopping instance is an infrastructure error; a failure
    /// inside the sandbox is captured into the result and never raised.
    pub async fn execute_request(&self, req: &Request) -> Result<ExecutionResult> {
        let entry = self
            .registry
            .get(&req.icode_id)
            .await
            .filter(|entry| entry.icode.status == ICodeStatus::Running)
            .ok_or_else(|| ApiError::NotFound(req.icode_id.clone()))?;

        // One call at a time per instance
        let _guard = entry.gate.lock().await;

        // Teardown may have won the gate while we waited
        match self.registry.get(&req.icode_id).await {
            Some(current) if current.icode.status == ICodeStatus::Running => {}
            _ => return Err(ApiError::NotFound(req.icode_id.clone())),
        }

        debug!(
            "Dispatching {} {} to icode {}",
            req.kind.as_str(),
            req.function,
            req.icode_id
        );

        match self
            .provider
            .invoke(&entry.handle, &req.function, req.kind, &req.args)
            .await
        {
            Ok(output) => {
                let output = match output {
                    serde_json::Value::Null => None,
                    value => Some(value),
                };
                Ok(ExecutionResult::success(&req.icode_id, output))
            }
            Err(e) => {
                debug!(
                    "Invocation {} on icode {} failed: {}",
                    req.function, req.icode_id, e
                );
                Ok(ExecutionResult::failure(&req.icode_id, e.to_string()))
            }
        }
    }

    /// Dispatch a batch, returning one result per request in request order
    ///
    /// Requests addressed to different instances run concurrently; requests
    /// for the same instance serialize on its gate. Per-item failures,
    /// including unknown instances, are captured into that item's result.
    pub async fn execute_request_list(&self, reqs: &[Request]) -> Vec<ExecutionResult> {
        let calls = reqs.iter().map(|req| async move {
            match self.execute_request(req).await {
                Ok(result) => result,
                Err(e) => ExecutionResult::failure(req.icode_id.clone(), e.to_string()),
            }
        });

        join_all(calls).await
    }
}
