//! Per-connection event channel
//!
//! Every pipeline run spawned from one connection holds a clone of the same
//! [`EventChannel`]. Writes go through a single async mutex so frames from
//! concurrent runs never interleave on the wire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::types::ProgressEvent;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Transport error: {0}")]
    Io(String),
}

/// Write half of a connection that can carry text frames.
#[async_trait]
pub trait EventTransport: Send {
    /// Write one complete text frame.
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError>;
}

/// Fire-and-forget sink for progress events
#[derive(Clone)]
pub struct EventChannel {
    transport: Arc<Mutex<Box<dyn EventTransport>>>,
    /// Frames written successfully
    sent: Arc<AtomicUsize>,
    /// Frames that could not be serialized or written
    failed: Arc<AtomicUsize>,
}

impl EventChannel {
    pub fn new(transport: impl EventTransport + 'static) -> Self {
        Self {
            transport: Arc::new(Mutex::new(Box::new(transport))),
            sent: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serialize `event` and write it as one frame.
    ///
    /// Failures are logged and counted, never returned: a requester that has
    /// gone away must not abort the pipeline that is reporting to it.
    pub async fn send(&self, event: &ProgressEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(request_id = %event.request_id, error = %e, "Failed to serialize event");
                return;
            }
        };

        debug!(
            request_id = %event.request_id,
            kind = %event.kind,
            message = %event.message,
            "Sending event"
        );

        let mut transport = self.transport.lock().await;
        match transport.send_text(frame).await {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    request_id = %event.request_id,
                    kind = %event.kind,
                    error = %e,
                    "Error sending event"
                );
            }
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("sent", &self.sent_count())
            .field("failed", &self.failed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    /// Writes a frame one byte at a time, yielding between bytes, so any
    /// missing exclusion would show up as torn lines.
    struct TricklingTransport {
        buffer: Arc<StdMutex<Vec<u8>>>,
    }

    #[async_trait]
    impl EventTransport for TricklingTransport {
        async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
            for byte in frame.bytes().chain(std::iter::once(b'\n')) {
                self.buffer.lock().unwrap().push(byte);
                tokio::task::yield_now().await;
            }
            Ok(())
        }
    }

    struct ClosedTransport;

    #[async_trait]
    impl EventTransport for ClosedTransport {
        async fn send_text(&mut self, _frame: String) -> Result<(), TransportError> {
            Err(TransportError::Closed)
        }
    }

    #[tokio::test]
    async fn test_send_writes_one_frame() {
        let buffer = Arc::new(StdMutex::new(Vec::new()));
        let channel = EventChannel::new(TricklingTransport {
            buffer: buffer.clone(),
        });

        let event = ProgressEvent::deployment_success(Uuid::new_v4(), "live at https://a.b");
        channel.send(&event).await;

        let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        let parsed: ProgressEvent = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(channel.sent_count(), 1);
        assert_eq!(channel.failed_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_do_not_interleave() {
        const RUNS: usize = 32;

        let buffer = Arc::new(StdMutex::new(Vec::new()));
        let channel = EventChannel::new(TricklingTransport {
            buffer: buffer.clone(),
        });

        let mut handles = Vec::new();
        for i in 0..RUNS {
            let channel = channel.clone();
            handles.push(tokio::spawn(async move {
                let event = ProgressEvent::deployment_error(
                    Uuid::new_v4(),
                    format!("run {} failed with a reasonably long diagnostic message", i),
                );
                channel.send(&event).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        let events: Vec<ProgressEvent> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("torn frame"))
            .collect();

        assert_eq!(events.len(), RUNS);
        assert!(events.iter().all(|e| e.kind == EventKind::DeploymentError));
        assert_eq!(channel.sent_count(), RUNS);
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let channel = EventChannel::new(ClosedTransport);

        channel
            .send(&ProgressEvent::test_failure(Uuid::new_v4(), "gone"))
            .await;
        channel
            .send(&ProgressEvent::test_failure(Uuid::new_v4(), "still gone"))
            .await;

        assert_eq!(channel.sent_count(), 0);
        assert_eq!(channel.failed_count(), 2);
    }

    #[test]
    fn test_clone_shares_counters() {
        let channel = EventChannel::new(ClosedTransport);
        let other = channel.clone();

        channel.failed.fetch_add(1, Ordering::Relaxed);
        assert_eq!(other.failed_count(), 1);
    }
}
