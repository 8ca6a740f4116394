use serde_json::Value;
use shipyard_core::DeploymentRequest;
use uuid::Uuid;

/// Inbound frame that is not a valid deployment request.
#[derive(Debug)]
pub struct InvalidRequest {
    /// `requestId` if the frame carried a readable one
    pub request_id: Option<Uuid>,
    pub error: serde_json::Error,
}

impl InvalidRequest {
    pub fn message(&self) -> String {
        format!("Invalid deployment request: {}", self.error)
    }
}

/// Decode one inbound frame.
pub fn parse_request(payload: &[u8]) -> Result<DeploymentRequest, InvalidRequest> {
    serde_json::from_slice::<DeploymentRequest>(payload).map_err(|error| InvalidRequest {
        request_id: recover_request_id(payload),
        error,
    })
}

fn recover_request_id(payload: &[u8]) -> Option<Uuid> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    value.get("requestId")?.as_str()?.parse().ok()
}
