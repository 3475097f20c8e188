//! Live WebSocket session registry.
//!
//! Maps each connection identity to the writer half of its socket. This is
//! the delivery primitive the signal hub sends through.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use tandem_core::{ConnectionId, OutboundEvent, Outbox};

pub type ClientSender = mpsc::UnboundedSender<OutboundEvent>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<ConnectionId, ClientSender>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the writer for a newly opened socket.
    pub async fn register(&self, id: ConnectionId, sender: ClientSender) {
        let mut w = self.sessions.write().await;
        w.insert(id, sender);
    }

    /// Forget a closed socket.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut w = self.sessions.write().await;
        w.remove(id);
    }

    /// Queue an event for a socket. `false` if it is unknown or closed.
    pub async fn send_to(&self, id: &ConnectionId, event: OutboundEvent) -> bool {
        let r = self.sessions.read().await;
        match r.get(id) {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Outbox for SessionRegistry {
    async fn deliver(&self, to: &ConnectionId, event: OutboundEvent) -> bool {
        self.send_to(to, event).await
    }
}
