//! Inbound and outbound signaling events.
//!
//! Inbound events arrive as `(name, data)` pairs from the transport and are
//! validated here before they ever reach the hub. Outbound events serialize
//! to `{ "event": <name>, "data": { ... } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SignalError;
use crate::types::{ConnectionId, Profile};

/// The three negotiation messages the router forwards between peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }

    /// Inbound field that carries the opaque payload for this kind.
    pub fn payload_field(&self) -> &'static str {
        match self {
            SignalKind::Offer | SignalKind::Answer => "sdp",
            SignalKind::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated relay request: where it goes and what it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEnvelope {
    pub to: ConnectionId,
    pub payload: Value,
    pub profile_hint: Option<Profile>,
}

/// Events a connection may send to the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ProfileUpdate { display_name: Option<String> },
    FindPartner { display_name: Option<String> },
    Relay { kind: SignalKind, envelope: RelayEnvelope },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    #[serde(alias = "userName")]
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignalPayload {
    to: Option<String>,
    sdp: Option<Value>,
    candidate: Option<Value>,
    profile_hint: Option<ProfilePayload>,
}

impl InboundEvent {
    /// Validate a named event and its JSON payload.
    ///
    /// Accepts the legacy names `user-info` and `ice-candidate` alongside the
    /// canonical ones. A `null` or absent payload is treated as `{}`.
    pub fn parse(name: &str, data: Value) -> Result<Self, SignalError> {
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };

        match name {
            "profile-update" | "user-info" => {
                let payload: ProfilePayload = decode(name, data)?;
                Ok(InboundEvent::ProfileUpdate {
                    display_name: payload.display_name,
                })
            }
            "find-partner" => {
                let payload: ProfilePayload = decode(name, data)?;
                Ok(InboundEvent::FindPartner {
                    display_name: payload.display_name,
                })
            }
            "offer" => Self::relay(name, SignalKind::Offer, data),
            "answer" => Self::relay(name, SignalKind::Answer, data),
            "candidate" | "ice-candidate" => Self::relay(name, SignalKind::Candidate, data),
            other => Err(SignalError::UnknownEvent(other.to_string())),
        }
    }

    fn relay(name: &str, kind: SignalKind, data: Value) -> Result<Self, SignalError> {
        let payload: SignalPayload = decode(name, data)?;

        let to = payload
            .to
            .filter(|to| !to.trim().is_empty())
            .ok_or_else(|| missing(name, "to"))?;

        let body = match kind {
            SignalKind::Offer | SignalKind::Answer => payload.sdp,
            SignalKind::Candidate => payload.candidate,
        }
        .ok_or_else(|| missing(name, kind.payload_field()))?;

        Ok(InboundEvent::Relay {
            kind,
            envelope: RelayEnvelope {
                to: ConnectionId::from(to),
                payload: body,
                profile_hint: payload
                    .profile_hint
                    .map(|hint| Profile::from_display_name(hint.display_name.as_deref())),
            },
        })
    }

    /// Canonical event name, used for logging and error replies.
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::ProfileUpdate { .. } => "profile-update",
            InboundEvent::FindPartner { .. } => "find-partner",
            InboundEvent::Relay { kind, .. } => kind.as_str(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, data: Value) -> Result<T, SignalError> {
    serde_json::from_value(data).map_err(|e| SignalError::InvalidPayload {
        event: name.to_string(),
        reason: e.to_string(),
    })
}

fn missing(event: &str, field: &str) -> SignalError {
    SignalError::MissingField {
        event: event.to_string(),
        field: field.to_string(),
    }
}

/// Sent once, right after the transport accepts a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedNotice {
    pub connection_id: ConnectionId,
}

/// Tells one side of a new pairing who its partner is and whether it opens
/// the negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedNotice {
    pub partner_id: ConnectionId,
    pub display_name: String,
    pub is_initiator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingNotice {
    pub message: String,
}

/// A forwarded negotiation message, as received by the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedSignal {
    pub from: ConnectionId,
    pub payload: Value,
    pub profile: Profile,
}

/// Why a partner went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveReason {
    Disconnected,
    ReSearching,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLeftNotice {
    pub partner_id: ConnectionId,
    pub reason: LeaveReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotice {
    pub event: Option<String>,
    pub message: String,
}

impl From<&SignalError> for ErrorNotice {
    fn from(err: &SignalError) -> Self {
        Self {
            event: err.event().map(String::from),
            message: err.to_string(),
        }
    }
}

/// Events the service pushes to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    Connected(ConnectedNotice),
    Paired(PairedNotice),
    Waiting(WaitingNotice),
    Offer(RelayedSignal),
    Answer(RelayedSignal),
    Candidate(RelayedSignal),
    PartnerLeft(PartnerLeftNotice),
    Error(ErrorNotice),
}

impl OutboundEvent {
    /// Wrap a forwarded payload in the event matching its kind.
    pub fn relayed(kind: SignalKind, signal: RelayedSignal) -> Self {
        match kind {
            SignalKind::Offer => OutboundEvent::Offer(signal),
            SignalKind::Answer => OutboundEvent::Answer(signal),
            SignalKind::Candidate => OutboundEvent::Candidate(signal),
        }
    }
}

/// An outbound event bound to its destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub event: OutboundEvent,
}

impl Delivery {
    pub fn new(to: ConnectionId, event: OutboundEvent) -> Self {
        Self { to, event }
    }
}
