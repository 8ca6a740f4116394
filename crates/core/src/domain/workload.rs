use serde::{Deserialize, Serialize};

/// Phase of a workload as reported by the cluster manager.
///
/// Parsed from the raw phase string; anything unrecognised is kept verbatim
/// in `Unknown` so it can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl WorkloadStatus {
    pub fn parse(phase: &str) -> Self {
        match phase.trim() {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// `Running` or `Succeeded`.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Running | Self::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Running => f.write_str("Running"),
            Self::Succeeded => f.write_str("Succeeded"),
            Self::Failed => f.write_str("Failed"),
            Self::Unknown(raw) if raw.is_empty() => f.write_str("<empty>"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}
