use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::message::{Delivery, OutboundEvent};
use crate::traits::Outbox;
use crate::types::ConnectionId;

/// Outbox that records every delivery instead of sending it.
#[derive(Default)]
pub struct RecordingOutbox {
    delivered: Mutex<Vec<Delivery>>,
    gone: Mutex<HashSet<ConnectionId>>,
}

impl RecordingOutbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make later deliveries to `id` fail, as if its socket had closed.
    pub fn close(&self, id: &ConnectionId) {
        self.gone.lock().unwrap().insert(id.clone());
    }

    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.delivered.lock().unwrap())
    }

    pub fn events_for(&self, id: &ConnectionId) -> Vec<OutboundEvent> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|d| &d.to == id)
            .map(|d| d.event.clone())
            .collect()
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn deliver(&self, to: &ConnectionId, event: OutboundEvent) -> bool {
        if self.gone.lock().unwrap().contains(to) {
            return false;
        }
        self.delivered
            .lock()
            .unwrap()
            .push(Delivery::new(to.clone(), event));
        true
    }
}
