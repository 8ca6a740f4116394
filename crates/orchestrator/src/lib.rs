pub mod cleanup;
pub mod cluster;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod readiness;
pub mod resources;
pub mod runner;
pub mod state_machine;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use cleanup::{schedule_cleanup, CleanupConfig, DEFAULT_TEST_WORKLOAD};
pub use cluster::{ClusterManager, KubectlCluster, KubectlConfig};
pub use dispatcher::Dispatcher;
pub use error::{OrchestratorError, Result};
pub use pipeline::{
    Pipeline, PipelineConfig, PipelineRun, RunOutcome, StageFailure, DEFAULT_PROD_TEMPLATE,
    DEFAULT_TEST_TEMPLATE,
};
pub use readiness::{ReadinessConfig, ReadinessMonitor};
pub use runner::{CommandRunner, ProcessRunner};
pub use state_machine::StageStateMachine;
pub use template::{Substitutions, TemplateApplier, DEFAULT_APPLY_SCRIPT};
