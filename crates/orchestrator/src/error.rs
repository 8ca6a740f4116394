use std::time::Duration;

use shipyard_core::DeploymentStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition {
        from: DeploymentStage,
        to: DeploymentStage,
    },

    #[error("Failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}\nOutput: {output}")]
    CommandTimeout {
        program: String,
        timeout: Duration,
        /// Whatever the program printed before it was killed
        output: String,
    },

    #[error("{program} failed: {status}\nOutput: {output}")]
    CommandFailed {
        program: String,
        status: String,
        output: String,
    },

    #[error("pod {workload} in namespace {scope} has failed")]
    WorkloadFailed { workload: String, scope: String },

    #[error("timeout waiting for pod {workload} in namespace {scope} after {timeout:?}")]
    ReadinessTimeout {
        workload: String,
        scope: String,
        timeout: Duration,
    },
}

impl OrchestratorError {
    /// Create a command failed error.
    pub fn command_failed(
        program: impl Into<String>,
        status: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            status: status.into(),
            output: output.into(),
        }
    }

    /// Captured output of the failing command, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } | Self::CommandTimeout { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::CommandTimeout { .. } | Self::ReadinessTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
