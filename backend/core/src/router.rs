//! Session Router.
//!
//! Forwards offers, answers and candidates to the addressed connection
//! without looking inside them.

use crate::message::{Delivery, OutboundEvent, RelayEnvelope, RelayedSignal, SignalKind};
use crate::registry::ConnectionRegistry;
use crate::types::ConnectionId;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Forward(Delivery),
    /// Destination is not a live connection; nothing is sent.
    Dropped { to: ConnectionId },
}

pub struct SessionRouter;

impl SessionRouter {
    /// Route one envelope from `sender`.
    ///
    /// The sender's profile hint wins over its registered profile.
    pub fn relay(
        kind: SignalKind,
        sender: &ConnectionId,
        envelope: RelayEnvelope,
        registry: &ConnectionRegistry,
        is_live: impl Fn(&ConnectionId) -> bool,
    ) -> RelayOutcome {
        let RelayEnvelope {
            to,
            payload,
            profile_hint,
        } = envelope;

        if !is_live(&to) {
            return RelayOutcome::Dropped { to };
        }

        let profile = profile_hint.unwrap_or_else(|| registry.get_profile(sender));
        let signal = RelayedSignal {
            from: sender.clone(),
            payload,
            profile,
        };
        RelayOutcome::Forward(Delivery::new(to, OutboundEvent::relayed(kind, signal)))
    }
}
