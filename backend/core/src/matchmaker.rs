//! Matchmaker.
//!
//! Pairs a connection asking for a partner with the longest-waiting one, or
//! parks it in the waiting pool. The connection that just asked always
//! initiates; the one that was waiting always answers. Giving both sides
//! the same role would deadlock or double-offer the negotiation.

use crate::message::{Delivery, OutboundEvent, PairedNotice, WaitingNotice};
use crate::pool::WaitingPool;
use crate::registry::ConnectionRegistry;
use crate::session::SessionTable;
use crate::types::{ConnectionId, Profile};

/// Acknowledgement text sent with `waiting`.
pub const WAITING_MESSAGE: &str = "You are waiting for a partner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Matched; the requester initiates, `partner` responds.
    Paired { partner: ConnectionId },
    /// Nobody else waiting; the requester is now in the pool.
    Waiting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindPartnerResult {
    pub outcome: MatchOutcome,
    /// Partner the requester walked away from by searching again.
    pub abandoned: Option<ConnectionId>,
    pub deliveries: Vec<Delivery>,
}

/// Owns the registry, the waiting pool and the pairing table.
#[derive(Debug, Default)]
pub struct Matchmaker {
    registry: ConnectionRegistry,
    pool: WaitingPool,
    sessions: SessionTable,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn update_profile(&mut self, id: &ConnectionId, display_name: Option<&str>) -> &Profile {
        self.registry.set_profile(id, display_name)
    }

    /// Match `requester` with a waiting connection or enqueue it.
    ///
    /// Runs to completion against in-memory state; the lookup and the removal
    /// of the chosen candidate cannot interleave with another request.
    pub fn find_partner(
        &mut self,
        requester: &ConnectionId,
        display_name: Option<&str>,
    ) -> FindPartnerResult {
        let requester_name = self
            .registry
            .set_profile(requester, display_name)
            .display_name
            .clone();
        let abandoned = self.sessions.unpair(requester);

        let Some(partner) = self.pool.find_partner_excluding(requester) else {
            self.pool.add(requester);
            return FindPartnerResult {
                outcome: MatchOutcome::Waiting,
                abandoned,
                deliveries: vec![Delivery::new(
                    requester.clone(),
                    OutboundEvent::Waiting(WaitingNotice {
                        message: WAITING_MESSAGE.to_string(),
                    }),
                )],
            };
        };

        self.pool.remove(&partner);
        self.pool.remove(requester);
        self.sessions.pair(requester, &partner);
        let partner_name = self.registry.get_profile(&partner).display_name;

        let deliveries = vec![
            Delivery::new(
                requester.clone(),
                OutboundEvent::Paired(PairedNotice {
                    partner_id: partner.clone(),
                    display_name: partner_name,
                    is_initiator: true,
                }),
            ),
            Delivery::new(
                partner.clone(),
                OutboundEvent::Paired(PairedNotice {
                    partner_id: requester.clone(),
                    display_name: requester_name,
                    is_initiator: false,
                }),
            ),
        ];

        FindPartnerResult {
            outcome: MatchOutcome::Paired { partner },
            abandoned,
            deliveries,
        }
    }

    /// Purge every trace of `id` and return the partner it was paired with.
    pub fn disconnect(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        self.pool.remove(id);
        self.registry.remove(id);
        self.sessions.unpair(id)
    }
}
