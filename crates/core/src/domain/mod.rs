mod request;
mod scope;
mod stage;
mod workload;

pub use request::DeploymentRequest;
pub use scope::{EndpointConfig, ResourceScope};
pub use stage::DeploymentStage;
pub use workload::WorkloadStatus;
