use thiserror::Error;

/// Errors surfaced by the signaling core.
///
/// None of these are fatal: a failed operation is reported back to the
/// offending connection and every other session carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("{event}: missing required field `{field}`")]
    MissingField { event: String, field: String },

    #[error("{event}: invalid payload: {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error("signal hub is not running")]
    HubUnavailable,
}

impl SignalError {
    /// Name of the inbound event that triggered the error, if known.
    pub fn event(&self) -> Option<&str> {
        match self {
            SignalError::MissingField { event, .. } | SignalError::InvalidPayload { event, .. } => {
                Some(event)
            }
            SignalError::UnknownEvent(name) => Some(name),
            SignalError::MalformedFrame(_) | SignalError::HubUnavailable => None,
        }
    }
}
