//! Progress events for Shipyard deployments
//!
//! This crate provides the event types sent back to requesters and the
//! per-connection channel that serializes them onto a shared transport.

mod channel;
mod types;

pub use channel::{EventChannel, EventTransport, TransportError};
pub use types::*;
