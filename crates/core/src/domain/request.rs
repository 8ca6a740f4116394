use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ResourceScope;

/// A single deployment request as received from a client connection.
///
/// Field names on the wire match the control protocol spoken by existing
/// clients (`userID`, `commitHash`, `repoURL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DeploymentRequest {
    /// Identity of the requester; first segment of the scope name
    #[serde(rename = "userID", alias = "requesterIdentity")]
    pub requester_identity: String,
    /// Source revision to deploy (usually a commit hash)
    #[serde(rename = "commitHash", alias = "sourceRevision")]
    pub source_revision: String,
    /// Fetchable repository address
    #[serde(rename = "repoURL", alias = "sourceLocation")]
    pub source_location: String,
    /// Optional client-chosen correlation id echoed on every event
    #[serde(
        rename = "requestId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<Uuid>,
}

impl DeploymentRequest {
    pub fn new(
        requester_identity: impl Into<String>,
        source_revision: impl Into<String>,
        source_location: impl Into<String>,
    ) -> Self {
        Self {
            requester_identity: requester_identity.into(),
            source_revision: source_revision.into(),
            source_location: source_location.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Scope this request deploys into.
    pub fn scope(&self) -> ResourceScope {
        ResourceScope::generate(
            &self.requester_identity,
            &self.source_location,
            &self.source_revision,
        )
    }
}
