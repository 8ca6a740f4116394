use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use events::{EventChannel, ProgressEvent};
use orchestrator::Dispatcher;

use crate::messages::{parse_request, InvalidRequest};
use crate::transport::SinkTransport;

#[derive(Clone)]
pub struct WsState {
    pub dispatcher: Dispatcher,
}

impl WsState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (sender, mut receiver) = socket.split();

    // one channel per connection, shared by every run it starts
    let channel = EventChannel::new(SinkTransport::new(sender));
    let mut dispatched: usize = 0;

    while let Some(msg) = receiver.next().await {
        let payload = match msg {
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "Error reading from WebSocket");
                break;
            }
        };

        match parse_request(&payload) {
            Ok(request) => {
                info!(
                    requester = %request.requester_identity,
                    revision = %request.source_revision,
                    location = %request.source_location,
                    "Received deployment request"
                );
                dispatched += 1;
                // the handle is dropped; the run reports through the channel
                let _ = state.dispatcher.dispatch(request, channel.clone());
            }
            Err(invalid) => {
                warn!(error = %invalid.error, "Rejected deployment request");
                tokio::spawn(reject(channel.clone(), invalid));
            }
        }
    }

    debug!(dispatched, sent = channel.sent_count(), "WebSocket connection closed");
}

/// Answer a malformed frame with a `deployment_error`, echoing its
/// `requestId` when one could be read.
async fn reject(channel: EventChannel, invalid: InvalidRequest) {
    let event = ProgressEvent::deployment_error(
        invalid.request_id.unwrap_or_else(Uuid::new_v4),
        invalid.message(),
    );
    channel.send(&event).await;
}
