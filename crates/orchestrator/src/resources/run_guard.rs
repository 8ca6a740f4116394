//! RAII guard for the terminal event of a pipeline run.
//!
//! A requester must see exactly one terminal event per request. The guard
//! covers the path where a run is torn down before it reports, such as a
//! panic inside a stage.

use events::{EventChannel, ProgressEvent};
use tracing::{debug, warn};
use uuid::Uuid;

pub const ABORTED_MESSAGE: &str = "Deployment aborted unexpectedly";

/// When dropped without [`RunGuard::mark_reported`], emits a
/// `deployment_error` on the run's channel.
pub struct RunGuard {
    request_id: Uuid,
    channel: Option<EventChannel>,
    reported: bool,
}

impl RunGuard {
    /// Create a new run guard.
    ///
    /// # Arguments
    ///
    /// * `request_id` - Correlation id of the run
    /// * `channel` - Optional channel the fallback event is sent on
    pub fn new(request_id: Uuid, channel: Option<EventChannel>) -> Self {
        debug!(request_id = %request_id, "Run guard created");

        Self {
            request_id,
            channel,
            reported: false,
        }
    }

    /// Record that the run has sent its terminal event.
    pub fn mark_reported(&mut self) {
        self.reported = true;
    }

    pub fn is_reported(&self) -> bool {
        self.reported
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.reported {
            return;
        }

        warn!(
            request_id = %self.request_id,
            "Run guard dropped without a terminal event - emitting failure"
        );

        let Some(channel) = self.channel.take() else {
            return;
        };
        let event = ProgressEvent::deployment_error(self.request_id, ABORTED_MESSAGE);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    channel.send(&event).await;
                });
            }
            Err(_) => {
                warn!(request_id = %self.request_id, "No runtime available for failure event");
            }
        }
    }
}
