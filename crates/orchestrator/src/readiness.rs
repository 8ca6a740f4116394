//! Polling readiness check for the transient workload.

use std::time::Duration;

use shipyard_core::ResourceScope;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cluster::ClusterManager;
use crate::error::{OrchestratorError, Result};

/// Floor for the poll period; a zero interval is not a valid tick period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ReadinessConfig {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

/// Waits for a workload to reach `Running` or `Succeeded`.
///
/// The first query happens one poll interval after the call. Query errors
/// and non-terminal phases are logged and polling continues; only the
/// overall deadline bounds a persistently unreachable cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessMonitor {
    config: ReadinessConfig,
}

impl ReadinessMonitor {
    pub fn new(config: ReadinessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    pub async fn wait_ready(
        &self,
        cluster: &dyn ClusterManager,
        scope: &ResourceScope,
        workload: &str,
    ) -> Result<()> {
        let start = Instant::now();
        let deadline = sleep(self.config.timeout);
        tokio::pin!(deadline);

        let period = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut polls: u32 = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    warn!(scope = %scope, workload = %workload, polls, "Timed out waiting for workload");
                    return Err(OrchestratorError::ReadinessTimeout {
                        workload: workload.to_string(),
                        scope: scope.to_string(),
                        timeout: self.config.timeout,
                    });
                }

                _ = ticker.tick() => {
                    polls += 1;

                    let status = match cluster.workload_status(scope, workload).await {
                        Ok(status) => status,
                        Err(e) => {
                            warn!(scope = %scope, workload = %workload, error = %e, "Error checking workload status");
                            continue;
                        }
                    };

                    debug!(scope = %scope, workload = %workload, status = %status, polls, "Workload status");

                    if status.is_ready() {
                        info!(
                            scope = %scope,
                            workload = %workload,
                            status = %status,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Workload ready"
                        );
                        return Ok(());
                    }

                    if status.is_failed() {
                        return Err(OrchestratorError::WorkloadFailed {
                            workload: workload.to_string(),
                            scope: scope.to_string(),
                        });
                    }
                }
            }
        }
    }
}
