use std::fmt::Display;

use async_trait::async_trait;
use axum::extract::ws::Message;
use events::{EventTransport, TransportError};
use futures_util::{Sink, SinkExt};

/// Adapts the write half of a WebSocket (or any message sink) to an
/// [`EventTransport`].
pub struct SinkTransport<S> {
    sink: S,
}

impl<S> SinkTransport<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl<S> EventTransport for SinkTransport<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
