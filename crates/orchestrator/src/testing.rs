//! In-memory doubles for the cluster manager and the event transport.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use events::{EventTransport, ProgressEvent, TransportError};
use shipyard_core::{ResourceScope, WorkloadStatus};

use crate::cluster::ClusterManager;
use crate::error::{OrchestratorError, Result};
use crate::template::Substitutions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    CreateScope(String),
    Apply {
        template: PathBuf,
        scope: String,
        substitutions: Substitutions,
    },
    Status {
        scope: String,
        workload: String,
    },
    Delete {
        scope: String,
        workload: String,
    },
}

/// Scriptable cluster: statuses are replayed in order, then `steady_status`
/// is reported forever.
pub struct FakeCluster {
    statuses: Mutex<VecDeque<Result<WorkloadStatus>>>,
    steady_status: WorkloadStatus,
    fail_create: bool,
    fail_template: Option<PathBuf>,
    fail_delete: bool,
    create_delay: Duration,
    calls: Mutex<Vec<ClusterCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            steady_status: WorkloadStatus::Pending,
            fail_create: false,
            fail_template: None,
            fail_delete: false,
            create_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = WorkloadStatus>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(Ok));
        self
    }

    pub fn with_status_error(self) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Err(OrchestratorError::command_failed(
                "kubectl",
                "exit status: 1",
                "Unable to connect to the server",
            )));
        self
    }

    pub fn with_steady_status(mut self, status: WorkloadStatus) -> Self {
        self.steady_status = status;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.fail_template = Some(template.into());
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn applied_templates(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ClusterCall::Apply { template, .. } => Some(template),
                _ => None,
            })
            .collect()
    }

    pub fn status_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ClusterCall::Status { .. }))
            .count()
    }

    pub fn deletes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ClusterCall::Delete { .. }))
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: ClusterCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ClusterManager for FakeCluster {
    async fn create_scope(&self, scope: &ResourceScope) -> Result<()> {
        self.record(ClusterCall::CreateScope(scope.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_create {
            return Err(OrchestratorError::command_failed(
                "kubectl",
                "exit status: 1",
                "namespaces \"x\" is forbidden",
            ));
        }
        Ok(())
    }

    async fn apply_template(
        &self,
        template: &Path,
        scope: &ResourceScope,
        substitutions: &Substitutions,
    ) -> Result<()> {
        self.record(ClusterCall::Apply {
            template: template.to_path_buf(),
            scope: scope.to_string(),
            substitutions: substitutions.clone(),
        });

        if self.fail_template.as_deref() == Some(template) {
            return Err(OrchestratorError::command_failed(
                "/scripts/apply-template.sh",
                "exit status: 1",
                "error validating data",
            ));
        }
        Ok(())
    }

    async fn workload_status(
        &self,
        scope: &ResourceScope,
        workload: &str,
    ) -> Result<WorkloadStatus> {
        self.record(ClusterCall::Status {
            scope: scope.to_string(),
            workload: workload.to_string(),
        });

        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.steady_status.clone()))
    }

    async fn delete_workload(&self, scope: &ResourceScope, workload: &str) -> Result<()> {
        self.record(ClusterCall::Delete {
            scope: scope.to_string(),
            workload: workload.to_string(),
        });

        if self.fail_delete {
            return Err(OrchestratorError::command_failed(
                "kubectl",
                "exit status: 1",
                "pods \"test-app\" not found",
            ));
        }
        Ok(())
    }
}

/// Transport that keeps every frame it is given.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    frames: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("frame is a progress event"))
            .collect()
    }
}

#[async_trait]
impl EventTransport for RecordingTransport {
    async fn send_text(&mut self, frame: String) -> std::result::Result<(), TransportError> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}
