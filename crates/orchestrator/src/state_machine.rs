use shipyard_core::DeploymentStage;

use crate::error::{OrchestratorError, Result};

pub struct StageStateMachine;

impl StageStateMachine {
    pub fn validate_transition(from: &DeploymentStage, to: &DeploymentStage) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: *from,
                to: *to,
            })
        }
    }

    fn allowed_transitions(from: &DeploymentStage) -> Vec<DeploymentStage> {
        match from {
            DeploymentStage::Received => {
                vec![DeploymentStage::ScopeCreated, DeploymentStage::Failed]
            }
            DeploymentStage::ScopeCreated => {
                vec![DeploymentStage::TestApplied, DeploymentStage::Failed]
            }
            DeploymentStage::TestApplied => {
                vec![DeploymentStage::TestReady, DeploymentStage::Failed]
            }
            DeploymentStage::TestReady => {
                vec![DeploymentStage::ProdApplied, DeploymentStage::Failed]
            }
            DeploymentStage::ProdApplied => {
                vec![DeploymentStage::CleanupScheduled, DeploymentStage::Failed]
            }
            DeploymentStage::CleanupScheduled => {
                vec![DeploymentStage::Succeeded, DeploymentStage::Failed]
            }
            DeploymentStage::Succeeded | DeploymentStage::Failed => vec![],
        }
    }

    pub fn can_transition(from: &DeploymentStage, to: &DeploymentStage) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_stage(current: &DeploymentStage) -> Option<DeploymentStage> {
        match current {
            DeploymentStage::Received => Some(DeploymentStage::ScopeCreated),
            DeploymentStage::ScopeCreated => Some(DeploymentStage::TestApplied),
            DeploymentStage::TestApplied => Some(DeploymentStage::TestReady),
            DeploymentStage::TestReady => Some(DeploymentStage::ProdApplied),
            DeploymentStage::ProdApplied => Some(DeploymentStage::CleanupScheduled),
            DeploymentStage::CleanupScheduled => Some(DeploymentStage::Succeeded),
            DeploymentStage::Succeeded | DeploymentStage::Failed => None,
        }
    }
}
