// ABOUTME: Core type definitions for ICode deployment and execution
// ABOUTME: Defines the instance record, request/result shapes, and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing a status string fails
#[derive(Error, Debug)]
#[error("Invalid status: {0}")]
pub struct InvalidStatus(pub String);

/// Lifecycle status of a deployed ICode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ICodeStatus {
    /// Sandbox is up and accepting requests
    Running,
    /// Teardown in progress, new requests are rejected
    Stopping,
}

impl ICodeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidStatus> {
        match s {
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

/// A deployed unit of executable logic fetched from a remote repository
/// and running inside an isolated sandbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ICode {
    /// Unique identity assigned at deploy time
    pub id: String,
    /// Final path segment of the source URL
    pub repository_name: String,
    /// Repository the unit was fetched from
    pub git_url: String,
    /// Local clone the sandbox was built from
    pub path: String,
    /// Current lifecycle status
    pub status: ICodeStatus,
    /// When the deployment completed
    pub deployed_at: DateTime<Utc>,
}

/// Kind of call dispatched into a sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// State-mutating call
    Invoke,
    /// Read-only call
    Query,
}

impl RequestKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Invoke => "invoke",
            Self::Query => "query",
        }
    }
}

/// A single invocation addressed to a running ICode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Identity of the target instance
    pub icode_id: String,
    /// Function to call inside the sandbox
    pub function: String,
    /// Invoke or query
    pub kind: RequestKind,
    /// Ordered string arguments
    pub args: Vec<String>,
}

impl Request {
    pub fn invoke(icode_id: impl Into<String>, function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            icode_id: icode_id.into(),
            function: function.into(),
            kind: RequestKind::Invoke,
            args,
        }
    }

    pub fn query(icode_id: impl Into<String>, function: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            icode_id: icode_id.into(),
            function: function.into(),
            kind: RequestKind::Query,
            args,
        }
    }
}

/// Outcome of one dispatched request
///
/// Failures at the sandbox level are carried here as values; they are never
/// raised as call errors, so one failing request cannot abort a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Instance the request was addressed to
    pub icode_id: String,
    /// Error text, empty on success
    pub error: String,
    /// Function output payload, if any
    pub output: Option<serde_json::Value>,
}

impl ExecutionResult {
    pub fn success(icode_id: impl Into<String>, output: Option<serde_json::Value>) -> Self {
        Self {
            icode_id: icode_id.into(),
            error: String::new(),
            output,
        }
    }

    pub fn failure(icode_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            icode_id: icode_id.into(),
            error: error.into(),
            output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(ICodeStatus::from_str("running").unwrap(), ICodeStatus::Running);
        assert_eq!(ICodeStatus::from_str("stopping").unwrap(), ICodeStatus::Stopping);
        assert_eq!(ICodeStatus::Running.as_str(), "running");
        assert!(ICodeStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_request_kind_serialization() {
        let json = serde_json::to_string(&RequestKind::Invoke).unwrap();
        assert_eq!(json, "\"invoke\"");
        let kind: RequestKind = serde_json::from_str("\"query\"").unwrap();
        assert_eq!(kind, RequestKind::Query);
    }

    #[test]
    fn test_request_constructors() {
        let req = Request::invoke("icode_1", "initA", vec![]);
        assert_eq!(req.kind, RequestKind::Invoke);
        assert_eq!(req.function, "initA");

        let req = Request::query("icode_1", "getA", vec!["key".to_string()]);
        assert_eq!(req.kind, RequestKind::Query);
        assert_eq!(req.args, vec!["key".to_string()]);
    }

    #[test]
    fn test_execution_result_success_discriminant() {
        let ok = ExecutionResult::success("icode_1", None);
        assert!(ok.is_success());
        assert_eq!(ok.error, "");

        let failed = ExecutionResult::failure("icode_1", "function not found");
        assert!(!failed.is_success());
        assert!(failed.output.is_none());
    }
}
