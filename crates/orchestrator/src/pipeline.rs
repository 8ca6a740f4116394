//! End-to-end deployment pipeline.
//!
//! A run creates the scope, applies the transient workload, waits for it to
//! become ready, promotes to production, schedules cleanup of the transient
//! workload and reports exactly one terminal event. The first failing stage
//! ends the run; nothing already created is rolled back.

use std::path::PathBuf;
use std::sync::Arc;

use events::{EventChannel, EventKind, ProgressEvent};
use shipyard_core::{DeploymentRequest, DeploymentStage, EndpointConfig, ResourceScope};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::cleanup::{schedule_cleanup, CleanupConfig, DEFAULT_TEST_WORKLOAD};
use crate::cluster::ClusterManager;
use crate::error::{OrchestratorError, Result};
use crate::readiness::{ReadinessConfig, ReadinessMonitor};
use crate::resources::RunGuard;
use crate::state_machine::StageStateMachine;
use crate::template::Substitutions;

pub const DEFAULT_TEST_TEMPLATE: &str = "/templates/test-pod.yaml";
pub const DEFAULT_PROD_TEMPLATE: &str = "/templates/prod-pod.yaml";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub test_template: PathBuf,
    pub prod_template: PathBuf,
    /// Transient workload watched for readiness
    pub test_workload: String,
    pub readiness: ReadinessConfig,
    pub cleanup: CleanupConfig,
    pub endpoint: EndpointConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_template: PathBuf::from(DEFAULT_TEST_TEMPLATE),
            prod_template: PathBuf::from(DEFAULT_PROD_TEMPLATE),
            test_workload: DEFAULT_TEST_WORKLOAD.to_string(),
            readiness: ReadinessConfig::default(),
            cleanup: CleanupConfig::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_readiness(mut self, readiness: ReadinessConfig) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupConfig) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// State of one run: its scope and how far it got.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub request_id: Uuid,
    pub scope: ResourceScope,
    stage: DeploymentStage,
}

impl PipelineRun {
    pub fn new(request_id: Uuid, scope: ResourceScope) -> Self {
        Self {
            request_id,
            scope,
            stage: DeploymentStage::Received,
        }
    }

    pub fn stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn advance(&mut self, to: DeploymentStage) -> Result<()> {
        StageStateMachine::validate_transition(&self.stage, &to)?;
        self.stage = to;
        Ok(())
    }
}

/// Why a run stopped, and what the requester is told.
#[derive(Debug, Clone)]
pub struct StageFailure {
    /// Last stage the run completed
    pub stage: DeploymentStage,
    pub kind: EventKind,
    pub message: String,
}

impl StageFailure {
    fn deployment_error(stage: DeploymentStage, message: String) -> Self {
        Self {
            stage,
            kind: EventKind::DeploymentError,
            message,
        }
    }

    fn test_failure(stage: DeploymentStage, message: String) -> Self {
        Self {
            stage,
            kind: EventKind::TestFailure,
            message,
        }
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub run: PipelineRun,
    /// The terminal event that was sent
    pub event: ProgressEvent,
    /// Pending transient-workload cleanup, on success only
    pub cleanup: Option<JoinHandle<()>>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.run.stage() == DeploymentStage::Succeeded
    }
}

pub struct Pipeline {
    cluster: Arc<dyn ClusterManager>,
    monitor: ReadinessMonitor,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(cluster: Arc<dyn ClusterManager>, config: PipelineConfig) -> Self {
        Self {
            cluster,
            monitor: ReadinessMonitor::new(config.readiness),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for `request` and send the terminal event on `channel`.
    pub async fn execute(&self, request: &DeploymentRequest, channel: &EventChannel) -> RunOutcome {
        let request_id = request.request_id.unwrap_or_else(Uuid::new_v4);
        let mut guard = RunGuard::new(request_id, Some(channel.clone()));
        let mut run = PipelineRun::new(request_id, request.scope());

        info!(
            request_id = %request_id,
            scope = %run.scope,
            requester = %request.requester_identity,
            revision = %request.source_revision,
            "Starting deployment"
        );

        let (event, cleanup) = match self.drive(&mut run, request).await {
            Ok((endpoint, cleanup)) => {
                info!(request_id = %request_id, scope = %run.scope, endpoint = %endpoint, "Deployment succeeded");
                let event = ProgressEvent::deployment_success(
                    request_id,
                    format!("Deployment successful! Your app is live at: {}", endpoint),
                );
                (event, Some(cleanup))
            }
            Err(failure) => {
                error!(
                    request_id = %request_id,
                    scope = %run.scope,
                    stage = %failure.stage,
                    kind = %failure.kind,
                    message = %failure.message,
                    "Deployment failed"
                );
                run.stage = DeploymentStage::Failed;
                (
                    ProgressEvent::new(failure.kind, request_id, failure.message),
                    None,
                )
            }
        };

        channel.send(&event).await;
        guard.mark_reported();

        RunOutcome {
            run,
            event,
            cleanup,
        }
    }

    async fn drive(
        &self,
        run: &mut PipelineRun,
        request: &DeploymentRequest,
    ) -> std::result::Result<(String, JoinHandle<()>), StageFailure> {
        let scope = run.scope.clone();

        self.cluster.create_scope(&scope).await.map_err(|e| {
            StageFailure::deployment_error(run.stage(), format!("Failed to create namespace: {}", e))
        })?;
        Self::step(run, DeploymentStage::ScopeCreated)?;

        let mut test_substitutions = Substitutions::new();
        test_substitutions.insert("PVCName".to_string(), scope.storage_name().to_string());
        test_substitutions.insert("Namespace".to_string(), scope.to_string());
        test_substitutions.insert("RepoURL".to_string(), request.source_location.clone());

        self.cluster
            .apply_template(&self.config.test_template, &scope, &test_substitutions)
            .await
            .map_err(|e| {
                StageFailure::deployment_error(run.stage(), format!("Failed to deploy test pod: {}", e))
            })?;
        Self::step(run, DeploymentStage::TestApplied)?;

        self.monitor
            .wait_ready(self.cluster.as_ref(), &scope, &self.config.test_workload)
            .await
            .map_err(|e| StageFailure::test_failure(run.stage(), format!("Tests failed: {}", e)))?;
        Self::step(run, DeploymentStage::TestReady)?;

        let mut prod_substitutions = Substitutions::new();
        prod_substitutions.insert("Namespace".to_string(), scope.to_string());

        self.cluster
            .apply_template(&self.config.prod_template, &scope, &prod_substitutions)
            .await
            .map_err(|e| {
                StageFailure::deployment_error(
                    run.stage(),
                    format!("Failed to deploy production pods: {}", e),
                )
            })?;
        Self::step(run, DeploymentStage::ProdApplied)?;

        let cleanup = self.schedule_transient_cleanup(run)?;

        let endpoint = scope.endpoint(&self.config.endpoint);
        Self::step(run, DeploymentStage::Succeeded)?;

        Ok((endpoint, cleanup))
    }

    /// The deletion only starts once the run has entered `CleanupScheduled`.
    fn schedule_transient_cleanup(
        &self,
        run: &mut PipelineRun,
    ) -> std::result::Result<JoinHandle<()>, StageFailure> {
        Self::step(run, DeploymentStage::CleanupScheduled)?;
        Ok(schedule_cleanup(
            Arc::clone(&self.cluster),
            run.scope.clone(),
            self.config.cleanup.clone(),
        ))
    }

    fn step(run: &mut PipelineRun, to: DeploymentStage) -> std::result::Result<(), StageFailure> {
        let from = run.stage();
        run.advance(to)
            .map_err(|e: OrchestratorError| StageFailure::deployment_error(from, e.to_string()))?;
        info!(request_id = %run.request_id, scope = %run.scope, stage = %to, "Stage complete");
        Ok(())
    }
}
