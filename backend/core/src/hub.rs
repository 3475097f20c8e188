//! Signal hub: the per-connection state machine.
//!
//! Connections move through `Unregistered -> Idle -> Searching -> Paired`
//! and are removed outright on disconnect. The hub owns the matchmaker and
//! the connection state table; it is driven by one task, so every command
//! sees the state left by the previous one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use tandem_logging::{SessionEvent, SessionEventLogger, sanitize_display_name};

use crate::channel::HubCommand;
use crate::matchmaker::{MatchOutcome, Matchmaker};
use crate::message::{
    ConnectedNotice, Delivery, InboundEvent, LeaveReason, OutboundEvent, PartnerLeftNotice,
    RelayEnvelope, SignalKind,
};
use crate::router::{RelayOutcome, SessionRouter};
use crate::traits::Outbox;
use crate::types::{ConnectionId, ConnectionState};

#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    /// Tell the surviving side when its partner disconnects or searches again.
    /// Off by default: clients are expected to notice on their own.
    pub notify_partner_on_leave: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSnapshot {
    pub connections: usize,
    pub waiting: usize,
    pub active_pairs: usize,
}

pub struct SignalHub<O> {
    config: HubConfig,
    matchmaker: Matchmaker,
    states: HashMap<ConnectionId, ConnectionState>,
    outbox: O,
}

impl<O: Outbox> SignalHub<O> {
    pub fn new(config: HubConfig, outbox: O) -> Self {
        Self {
            config,
            matchmaker: Matchmaker::new(),
            states: HashMap::new(),
            outbox,
        }
    }

    pub fn state_of(&self, id: &ConnectionId) -> Option<ConnectionState> {
        self.states.get(id).copied()
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            connections: self.states.len(),
            waiting: self.matchmaker.pool().len(),
            active_pairs: self.matchmaker.sessions().active_pairs(),
        }
    }

    /// Drain commands until every [`HubHandle`](crate::HubHandle) is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        info!(
            notify_partner_on_leave = self.config.notify_partner_on_leave,
            "Signal hub started"
        );

        while let Some(command) = rx.recv().await {
            match command {
                HubCommand::Connect { id } => self.connect(id).await,
                HubCommand::Event { from, event } => self.handle(&from, event).await,
                HubCommand::Disconnect { id, reason } => self.disconnect(&id, &reason).await,
                HubCommand::Snapshot { reply } => {
                    // Requester may have given up waiting.
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        info!("Signal hub stopped");
    }

    /// Register a freshly accepted connection and tell it its identity.
    pub async fn connect(&mut self, id: ConnectionId) {
        if self.states.contains_key(&id) {
            debug!(connection_id = %id, "Duplicate connect ignored");
            return;
        }

        self.states.insert(id.clone(), ConnectionState::Unregistered);
        SessionEventLogger::log_event(id.as_str(), SessionEvent::Connected);

        let notice = OutboundEvent::Connected(ConnectedNotice {
            connection_id: id.clone(),
        });
        self.dispatch(Delivery::new(id, notice)).await;
    }

    /// Apply one validated event from `from`.
    pub async fn handle(&mut self, from: &ConnectionId, event: InboundEvent) {
        let Some(state) = self.state_of(from) else {
            debug!(connection_id = %from, event = event.name(), "Event from unknown connection ignored");
            return;
        };

        match event {
            InboundEvent::ProfileUpdate { display_name } => {
                let profile = self.matchmaker.update_profile(from, display_name.as_deref());
                debug!(
                    connection_id = %from,
                    display_name = %sanitize_display_name(&profile.display_name),
                    "Profile updated"
                );
                if state == ConnectionState::Unregistered {
                    self.set_state(from, ConnectionState::Idle);
                }
            }
            InboundEvent::FindPartner { display_name } => {
                self.find_partner(from, display_name.as_deref()).await;
            }
            InboundEvent::Relay { kind, envelope } => {
                self.relay(from, kind, envelope).await;
            }
        }
    }

    /// Purge `id` from every table. Safe to call more than once.
    pub async fn disconnect(&mut self, id: &ConnectionId, reason: &str) {
        let known = self.states.remove(id).is_some();
        let partner = self.matchmaker.disconnect(id);

        if !known {
            debug!(connection_id = %id, "Disconnect for unknown connection ignored");
            return;
        }

        SessionEventLogger::log_event(
            id.as_str(),
            SessionEvent::Left {
                reason: reason.to_string(),
            },
        );

        if let Some(partner) = partner {
            self.partner_left(&partner, id, LeaveReason::Disconnected)
                .await;
        }
    }

    async fn find_partner(&mut self, requester: &ConnectionId, display_name: Option<&str>) {
        let result = self.matchmaker.find_partner(requester, display_name);

        if let Some(abandoned) = &result.abandoned {
            self.partner_left(abandoned, requester, LeaveReason::ReSearching)
                .await;
        }

        match &result.outcome {
            MatchOutcome::Paired { partner } => {
                self.set_state(requester, ConnectionState::Paired);
                self.set_state(partner, ConnectionState::Paired);
                for delivery in &result.deliveries {
                    if let OutboundEvent::Paired(notice) = &delivery.event {
                        SessionEventLogger::log_event(
                            delivery.to.as_str(),
                            SessionEvent::Paired {
                                partner_id: notice.partner_id.to_string(),
                                display_name: notice.display_name.clone(),
                                initiator: notice.is_initiator,
                            },
                        );
                    }
                }
            }
            MatchOutcome::Waiting => {
                self.set_state(requester, ConnectionState::Searching);
                SessionEventLogger::log_event(
                    requester.as_str(),
                    SessionEvent::Waiting {
                        display_name: self.matchmaker.registry().get_profile(requester).display_name,
                    },
                );
            }
        }

        for delivery in result.deliveries {
            self.dispatch(delivery).await;
        }
    }

    async fn relay(&mut self, from: &ConnectionId, kind: SignalKind, envelope: RelayEnvelope) {
        let states = &self.states;
        let outcome = SessionRouter::relay(
            kind,
            from,
            envelope,
            self.matchmaker.registry(),
            |id| states.contains_key(id),
        );

        let (to, delivered) = match outcome {
            RelayOutcome::Forward(Delivery { to, event }) => {
                let delivered = self.outbox.deliver(&to, event).await;
                (to, delivered)
            }
            RelayOutcome::Dropped { to } => (to, false),
        };

        let event = if delivered {
            SessionEvent::Relayed {
                kind: kind.to_string(),
                to: to.to_string(),
            }
        } else {
            SessionEvent::Dropped {
                kind: kind.to_string(),
                to: to.to_string(),
            }
        };
        SessionEventLogger::log_event(from.as_str(), event);
    }

    /// `survivor` lost its partner `leaver`; it is no longer paired.
    async fn partner_left(
        &mut self,
        survivor: &ConnectionId,
        leaver: &ConnectionId,
        reason: LeaveReason,
    ) {
        if self.state_of(survivor) == Some(ConnectionState::Paired) {
            self.set_state(survivor, ConnectionState::Idle);
        }

        if self.config.notify_partner_on_leave {
            let notice = OutboundEvent::PartnerLeft(PartnerLeftNotice {
                partner_id: leaver.clone(),
                reason,
            });
            self.dispatch(Delivery::new(survivor.clone(), notice)).await;
        }
    }

    fn set_state(&mut self, id: &ConnectionId, next: ConnectionState) {
        if let Some(state) = self.states.get_mut(id) {
            debug!(connection_id = %id, from = %state, to = %next, "State transition");
            *state = next;
        }
    }

    async fn dispatch(&self, delivery: Delivery) {
        let Delivery { to, event } = delivery;
        if !self.outbox.deliver(&to, event).await {
            debug!(connection_id = %to, "Connection gone, delivery dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::channel::spawn_hub;
    use crate::error::SignalError;
    use crate::message::PairedNotice;
    use crate::testing::RecordingOutbox;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn hub(notify: bool) -> (SignalHub<Arc<RecordingOutbox>>, Arc<RecordingOutbox>) {
        let outbox = RecordingOutbox::new();
        let config = HubConfig {
            notify_partner_on_leave: notify,
        };
        (SignalHub::new(config, outbox.clone()), outbox)
    }

    async fn connect_all(hub: &mut SignalHub<Arc<RecordingOutbox>>, ids: &[&str]) {
        for name in ids {
            hub.connect(id(name)).await;
        }
    }

    fn find(name: &str) -> InboundEvent {
        InboundEvent::FindPartner {
            display_name: Some(name.to_string()),
        }
    }

    fn offer_to(to: &str) -> InboundEvent {
        InboundEvent::parse("offer", json!({"to": to, "sdp": {"type": "offer"}})).unwrap()
    }

    fn paired(events: &[OutboundEvent]) -> Vec<PairedNotice> {
        events
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Paired(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    fn waiting_count(events: &[OutboundEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, OutboundEvent::Waiting(_)))
            .count()
    }

    #[tokio::test]
    async fn connect_announces_identity() {
        let (mut hub, outbox) = hub(false);
        hub.connect(id("a")).await;

        assert_eq!(hub.state_of(&id("a")), Some(ConnectionState::Unregistered));
        assert_eq!(
            outbox.events_for(&id("a")),
            vec![OutboundEvent::Connected(ConnectedNotice {
                connection_id: id("a")
            })]
        );
    }

    #[tokio::test]
    async fn profile_update_moves_to_idle() {
        let (mut hub, _) = hub(false);
        hub.connect(id("a")).await;
        hub.handle(
            &id("a"),
            InboundEvent::ProfileUpdate {
                display_name: Some("ada".into()),
            },
        )
        .await;

        assert_eq!(hub.state_of(&id("a")), Some(ConnectionState::Idle));
        assert_eq!(
            hub.matchmaker().registry().get_profile(&id("a")).display_name,
            "ada"
        );
    }

    #[tokio::test]
    async fn lone_searcher_gets_exactly_one_waiting() {
        let (mut hub, outbox) = hub(false);
        hub.connect(id("a")).await;
        hub.handle(&id("a"), find("ada")).await;

        let events = outbox.events_for(&id("a"));
        assert_eq!(waiting_count(&events), 1);
        assert!(paired(&events).is_empty());
        assert_eq!(hub.state_of(&id("a")), Some(ConnectionState::Searching));
        assert!(hub.matchmaker().pool().contains(&id("a")));
    }

    #[tokio::test]
    async fn arrivals_a_b_c_leave_only_c_waiting() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b", "c"]).await;

        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        hub.handle(&id("c"), find("cy")).await;

        let for_a = paired(&outbox.events_for(&id("a")));
        let for_b = paired(&outbox.events_for(&id("b")));
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_a[0].partner_id, id("b"));
        assert_eq!(for_a[0].display_name, "bob");
        assert!(!for_a[0].is_initiator);
        assert_eq!(for_b[0].partner_id, id("a"));
        assert_eq!(for_b[0].display_name, "ada");
        assert!(for_b[0].is_initiator);

        assert_eq!(waiting_count(&outbox.events_for(&id("c"))), 1);
        let pool: Vec<_> = hub.matchmaker().pool().iter().cloned().collect();
        assert_eq!(pool, vec![id("c")]);

        assert_eq!(hub.state_of(&id("a")), Some(ConnectionState::Paired));
        assert_eq!(hub.state_of(&id("b")), Some(ConnectionState::Paired));
        assert_eq!(hub.state_of(&id("c")), Some(ConnectionState::Searching));
        assert_eq!(
            hub.snapshot(),
            HubSnapshot {
                connections: 3,
                waiting: 1,
                active_pairs: 1
            }
        );
    }

    #[tokio::test]
    async fn relay_reaches_partner_verbatim() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        outbox.take();

        hub.handle(&id("b"), offer_to("a")).await;

        let delivered = outbox.take();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, id("a"));
        let OutboundEvent::Offer(signal) = &delivered[0].event else {
            panic!("expected offer");
        };
        assert_eq!(signal.from, id("b"));
        assert_eq!(signal.payload, json!({"type": "offer"}));
        assert_eq!(signal.profile.display_name, "bob");
    }

    #[tokio::test]
    async fn relay_to_disconnected_peer_is_dropped() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        hub.disconnect(&id("a"), "transport close").await;
        outbox.take();

        hub.handle(&id("b"), offer_to("a")).await;
        hub.handle(&id("b"), offer_to("never-existed")).await;

        assert!(outbox.take().is_empty());
        assert_eq!(hub.state_of(&id("b")), Some(ConnectionState::Idle));
    }

    #[tokio::test]
    async fn relay_to_closed_socket_does_not_panic() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b"]).await;
        outbox.close(&id("a"));
        outbox.take();

        hub.handle(&id("b"), offer_to("a")).await;
        assert!(outbox.take().is_empty());
    }

    #[tokio::test]
    async fn disconnect_purges_registry_and_pool() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "c"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.disconnect(&id("a"), "ping timeout").await;

        assert_eq!(hub.state_of(&id("a")), None);
        assert!(!hub.matchmaker().pool().contains(&id("a")));
        assert!(!hub.matchmaker().registry().contains(&id("a")));

        hub.handle(&id("c"), find("cy")).await;
        assert!(paired(&outbox.events_for(&id("c"))).is_empty());
        assert_eq!(waiting_count(&outbox.events_for(&id("c"))), 1);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (mut hub, _) = hub(true);
        connect_all(&mut hub, &["a"]).await;
        hub.disconnect(&id("a"), "gone").await;
        hub.disconnect(&id("a"), "gone again").await;
        assert_eq!(hub.snapshot(), HubSnapshot::default());
    }

    #[tokio::test]
    async fn events_after_disconnect_are_ignored() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a"]).await;
        hub.disconnect(&id("a"), "gone").await;
        outbox.take();

        hub.handle(&id("a"), find("ada")).await;
        assert!(outbox.take().is_empty());
        assert!(hub.matchmaker().pool().is_empty());
        assert!(!hub.matchmaker().registry().contains(&id("a")));
    }

    #[tokio::test]
    async fn partner_is_not_told_by_default() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        outbox.take();

        hub.disconnect(&id("a"), "closed").await;
        assert!(outbox.take().is_empty());
    }

    #[tokio::test]
    async fn partner_is_told_on_disconnect_when_enabled() {
        let (mut hub, outbox) = hub(true);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        outbox.take();

        hub.disconnect(&id("a"), "closed").await;

        assert_eq!(
            outbox.take(),
            vec![Delivery::new(
                id("b"),
                OutboundEvent::PartnerLeft(PartnerLeftNotice {
                    partner_id: id("a"),
                    reason: LeaveReason::Disconnected,
                })
            )]
        );
        assert_eq!(hub.state_of(&id("b")), Some(ConnectionState::Idle));
    }

    #[tokio::test]
    async fn searching_again_notifies_abandoned_partner_when_enabled() {
        let (mut hub, outbox) = hub(true);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        outbox.take();

        hub.handle(&id("b"), find("bob")).await;

        let for_a = outbox.events_for(&id("a"));
        assert_eq!(
            for_a,
            vec![OutboundEvent::PartnerLeft(PartnerLeftNotice {
                partner_id: id("b"),
                reason: LeaveReason::ReSearching,
            })]
        );
        assert_eq!(hub.state_of(&id("a")), Some(ConnectionState::Idle));
        assert_eq!(hub.state_of(&id("b")), Some(ConnectionState::Searching));
        assert_eq!(hub.snapshot().active_pairs, 0);
    }

    #[tokio::test]
    async fn searching_again_is_silent_by_default() {
        let (mut hub, outbox) = hub(false);
        connect_all(&mut hub, &["a", "b"]).await;
        hub.handle(&id("a"), find("ada")).await;
        hub.handle(&id("b"), find("bob")).await;
        outbox.take();

        hub.handle(&id("b"), find("bob")).await;
        assert!(outbox.events_for(&id("a")).is_empty());
    }

    #[tokio::test]
    async fn many_searchers_pair_without_self_matches() {
        let (mut hub, outbox) = hub(false);
        let names: Vec<String> = (0..9).map(|n| format!("c{n}")).collect();
        for (n, name) in names.iter().enumerate() {
            hub.connect(id(name)).await;
            hub.handle(&id(name), find(name)).await;
            if n % 2 == 0 {
                // Lands in an empty pool; asking twice must not self-match.
                hub.handle(&id(name), find(name)).await;
            }
        }

        let mut initiators = 0;
        for name in &names {
            for notice in paired(&outbox.events_for(&id(name))) {
                assert_ne!(notice.partner_id, id(name));
                if notice.is_initiator {
                    initiators += 1;
                }
            }
        }
        let pairs = hub.snapshot().active_pairs;
        assert_eq!(pairs, 4);
        assert_eq!(initiators, pairs);
        assert_eq!(hub.snapshot().waiting, 1);
    }

    #[tokio::test]
    async fn actor_serialises_commands() {
        let (hub, outbox) = hub(false);
        let (handle, task) = spawn_hub(hub, 16);

        handle.connect(id("a")).await.unwrap();
        handle.connect(id("b")).await.unwrap();
        handle.submit(id("a"), find("ada")).await.unwrap();
        handle.submit(id("b"), find("bob")).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.connections, 2);
        assert_eq!(snapshot.active_pairs, 1);
        assert_eq!(paired(&outbox.events_for(&id("a"))).len(), 1);

        handle.disconnect(id("a"), "bye").await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().connections, 1);

        task.abort();
        let _ = task.await;
        assert_eq!(handle.snapshot().await, Err(SignalError::HubUnavailable));
    }
}
