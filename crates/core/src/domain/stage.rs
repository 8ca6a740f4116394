use serde::{Deserialize, Serialize};

/// Position of a pipeline run in the deployment workflow.
///
/// Runs only ever move forward; `Failed` is reachable from every
/// non-terminal stage and is absorbing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStage {
    #[default]
    Received,
    ScopeCreated,
    TestApplied,
    TestReady,
    ProdApplied,
    CleanupScheduled,
    Succeeded,
    Failed,
}

impl DeploymentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ScopeCreated => "scope_created",
            Self::TestApplied => "test_applied",
            Self::TestReady => "test_ready",
            Self::ProdApplied => "prod_applied",
            Self::CleanupScheduled => "cleanup_scheduled",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received" => Some(Self::Received),
            "scope_created" => Some(Self::ScopeCreated),
            "test_applied" => Some(Self::TestApplied),
            "test_ready" => Some(Self::TestReady),
            "prod_applied" => Some(Self::ProdApplied),
            "cleanup_scheduled" => Some(Self::CleanupScheduled),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
