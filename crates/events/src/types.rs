//! Event types streamed back to deployment requesters

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal outcome kinds a pipeline run can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Scope or workload provisioning failed
    DeploymentError,
    /// The transient workload failed or never became ready
    TestFailure,
    /// Production workload applied; message carries the endpoint
    DeploymentSuccess,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeploymentError => "deployment_error",
            Self::TestFailure => "test_failure",
            Self::DeploymentSuccess => "deployment_success",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound notification.
///
/// Serialized as `{"event": "<kind>", "message": "...", "request_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProgressEvent {
    /// What happened
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Human readable detail, including captured command output on failure
    pub message: String,
    /// Correlates the event with the request that produced it
    pub request_id: Uuid,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, request_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            request_id,
        }
    }

    pub fn deployment_error(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(EventKind::DeploymentError, request_id, message)
    }

    pub fn test_failure(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(EventKind::TestFailure, request_id, message)
    }

    pub fn deployment_success(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(EventKind::DeploymentSuccess, request_id, message)
    }

    pub fn is_success(&self) -> bool {
        self.kind == EventKind::DeploymentSuccess
    }
}
