//! `tandem-core`: rendezvous state for two-party real-time sessions.
//!
//! Tracks connections, pairs waiting ones, and relays opaque negotiation
//! payloads between partners. All state lives in a [`SignalHub`] driven by a
//! single task; transports reach it through a [`HubHandle`] and receive
//! events through their [`Outbox`] implementation.

pub mod channel;
pub mod error;
pub mod hub;
pub mod matchmaker;
pub mod message;
pub mod pool;
pub mod registry;
pub mod router;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use channel::{spawn_hub, HubCommand, HubHandle, DEFAULT_HUB_BUFFER};
pub use error::SignalError;
pub use hub::{HubConfig, HubSnapshot, SignalHub};
pub use matchmaker::{FindPartnerResult, MatchOutcome, Matchmaker};
pub use message::{
    Delivery, ErrorNotice, InboundEvent, LeaveReason, OutboundEvent, PairedNotice,
    RelayEnvelope, RelayedSignal, SignalKind,
};
pub use pool::WaitingPool;
pub use registry::ConnectionRegistry;
pub use router::{RelayOutcome, SessionRouter};
pub use session::SessionTable;
pub use traits::Outbox;
pub use types::{ConnectionId, ConnectionState, Profile, DEFAULT_DISPLAY_NAME};
