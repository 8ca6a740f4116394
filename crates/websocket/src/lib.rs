mod handler;
mod messages;
mod transport;

pub use handler::{ws_handler, WsState};
pub use messages::{parse_request, InvalidRequest};
pub use transport::SinkTransport;
