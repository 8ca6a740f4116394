//! Spawns one independent pipeline run per request.

use std::sync::Arc;

use events::EventChannel;
use shipyard_core::DeploymentRequest;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::pipeline::{Pipeline, RunOutcome};

/// Cheap to clone; every connection holds one.
#[derive(Clone)]
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    /// Bounds concurrently executing runs when set
    limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            limiter: None,
        }
    }

    /// Allow at most `max` runs to execute at once. Excess runs wait for a
    /// slot inside their own task, so dispatching never blocks the caller.
    pub fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.limiter = max.map(|max| Arc::new(Semaphore::new(max.max(1))));
        self
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Start a run for `request` reporting on `channel` and return at once.
    pub fn dispatch(&self, request: DeploymentRequest, channel: EventChannel) -> JoinHandle<RunOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let limiter = self.limiter.clone();

        tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => {
                    debug!(available = limiter.available_permits(), "Waiting for run slot");
                    limiter.acquire_owned().await.ok()
                }
                None => None,
            };

            pipeline.execute(&request, &channel).await
        })
    }
}
