//! Explicit pairing table.
//!
//! Records who is paired with whom so a pairing can be torn down from
//! either side. Entries are always symmetric.

use std::collections::HashMap;

use crate::types::ConnectionId;

#[derive(Debug, Default)]
pub struct SessionTable {
    partners: HashMap<ConnectionId, ConnectionId>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pairing. Any previous pairing of either side is dropped first.
    pub fn pair(&mut self, a: &ConnectionId, b: &ConnectionId) {
        debug_assert_ne!(a, b, "a connection cannot pair with itself");
        self.unpair(a);
        self.unpair(b);
        self.partners.insert(a.clone(), b.clone());
        self.partners.insert(b.clone(), a.clone());
    }

    /// End the pairing `id` belongs to and return the former partner.
    pub fn unpair(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        let partner = self.partners.remove(id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<&ConnectionId> {
        self.partners.get(id)
    }

    pub fn active_pairs(&self) -> usize {
        self.partners.len() / 2
    }
}
