//! Delayed teardown of the transient workload.

use std::sync::Arc;
use std::time::Duration;

use shipyard_core::ResourceScope;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cluster::ClusterManager;

pub const DEFAULT_TEST_WORKLOAD: &str = "test-app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupConfig {
    /// How long the transient workload is kept after promotion
    pub delay: Duration,
    /// Workload deleted once the delay elapses
    pub workload: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            workload: DEFAULT_TEST_WORKLOAD.to_string(),
        }
    }
}

/// Spawn a detached task that deletes the transient workload after
/// `config.delay`. The outcome is only logged.
pub fn schedule_cleanup(
    cluster: Arc<dyn ClusterManager>,
    scope: ResourceScope,
    config: CleanupConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(config.delay).await;

        match cluster.delete_workload(&scope, &config.workload).await {
            Ok(()) => info!(
                scope = %scope,
                workload = %config.workload,
                "Successfully cleaned up transient workload"
            ),
            Err(e) => error!(
                scope = %scope,
                workload = %config.workload,
                error = %e,
                "Error cleaning up transient workload"
            ),
        }
    })
}
