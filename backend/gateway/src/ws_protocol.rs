//! WebSocket wire protocol.
//!
//! Every text frame is one JSON event. Clients may send either
//! `{ "event": "find-partner", "data": { ... } }` or the positional form
//! `["find-partner", { ... }]`; the server always answers in the object form.

use serde::Deserialize;
use serde_json::Value;

use tandem_core::{ErrorNotice, InboundEvent, OutboundEvent, SignalError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientFrame {
    Named {
        event: String,
        #[serde(default)]
        data: Value,
    },
    Positional(String, Value),
}

/// Parse and validate one inbound text frame.
pub fn decode_frame(text: &str) -> Result<InboundEvent, SignalError> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|_| SignalError::MalformedFrame("expected {\"event\", \"data\"}".into()))?;

    let (event, data) = match frame {
        ClientFrame::Named { event, data } => (event, data),
        ClientFrame::Positional(event, data) => (event, data),
    };
    InboundEvent::parse(&event, data)
}

pub fn encode_event(event: &OutboundEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

/// Reply sent to a connection whose frame was rejected.
pub fn error_event(err: &SignalError) -> OutboundEvent {
    OutboundEvent::Error(ErrorNotice::from(err))
}
