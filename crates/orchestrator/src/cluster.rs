//! Seam to the external cluster-resource manager.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shipyard_core::{ResourceScope, WorkloadStatus};
use tracing::debug;

use crate::error::Result;
use crate::runner::CommandRunner;
use crate::template::{Substitutions, TemplateApplier, DEFAULT_APPLY_SCRIPT};

/// Operations the pipeline needs from the cluster manager.
#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// Create the isolated scope (namespace) a deployment lives in.
    async fn create_scope(&self, scope: &ResourceScope) -> Result<()>;

    /// Render `template` with `substitutions` and apply it inside `scope`.
    async fn apply_template(
        &self,
        template: &Path,
        scope: &ResourceScope,
        substitutions: &Substitutions,
    ) -> Result<()>;

    /// Point-in-time phase of a workload.
    async fn workload_status(&self, scope: &ResourceScope, workload: &str)
        -> Result<WorkloadStatus>;

    async fn delete_workload(&self, scope: &ResourceScope, workload: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct KubectlConfig {
    /// kubectl binary
    pub kubectl: String,
    /// Script that renders and applies a template
    pub apply_script: PathBuf,
    /// Bound for create, apply and delete calls
    pub command_timeout: Duration,
    /// Bound for a single status query
    pub status_timeout: Duration,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            apply_script: PathBuf::from(DEFAULT_APPLY_SCRIPT),
            command_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_secs(10),
        }
    }
}

/// [`ClusterManager`] that shells out to `kubectl` and the apply script.
pub struct KubectlCluster {
    runner: Arc<dyn CommandRunner>,
    applier: TemplateApplier,
    config: KubectlConfig,
}

impl KubectlCluster {
    pub fn new(runner: Arc<dyn CommandRunner>, config: KubectlConfig) -> Self {
        let applier = TemplateApplier::new(Arc::clone(&runner))
            .with_script(config.apply_script.clone())
            .with_timeout(config.command_timeout);

        Self {
            runner,
            applier,
            config,
        }
    }

    pub fn config(&self) -> &KubectlConfig {
        &self.config
    }

    async fn kubectl(&self, timeout: Duration, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.runner.run(timeout, &self.config.kubectl, &args).await
    }
}

#[async_trait]
impl ClusterManager for KubectlCluster {
    async fn create_scope(&self, scope: &ResourceScope) -> Result<()> {
        self.kubectl(
            self.config.command_timeout,
            &["create", "namespace", scope.as_str()],
        )
        .await?;
        Ok(())
    }

    async fn apply_template(
        &self,
        template: &Path,
        scope: &ResourceScope,
        substitutions: &Substitutions,
    ) -> Result<()> {
        self.applier.apply(template, scope, substitutions).await
    }

    async fn workload_status(
        &self,
        scope: &ResourceScope,
        workload: &str,
    ) -> Result<WorkloadStatus> {
        let output = self
            .kubectl(
                self.config.status_timeout,
                &[
                    "get",
                    "pod",
                    workload,
                    "-n",
                    scope.as_str(),
                    "-o",
                    "jsonpath={.status.phase}",
                ],
            )
            .await?;

        debug!(scope = %scope, workload = %workload, phase = %output, "Pod status");
        Ok(WorkloadStatus::parse(&output))
    }

    async fn delete_workload(&self, scope: &ResourceScope, workload: &str) -> Result<()> {
        self.kubectl(
            self.config.command_timeout,
            &["delete", "pod", workload, "-n", scope.as_str()],
        )
        .await?;
        Ok(())
    }
}
