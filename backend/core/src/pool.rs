//! Waiting Pool.
//!
//! Connections looking for a partner. Candidates are offered oldest first,
//! so when several connections are waiting the one that has waited longest
//! is matched next.

use std::collections::VecDeque;

use crate::types::ConnectionId;

#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<ConnectionId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longest-waiting member other than `id`.
    pub fn find_partner_excluding(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.queue.iter().find(|candidate| *candidate != id).cloned()
    }

    /// Returns `false` if `id` was already waiting.
    pub fn add(&mut self, id: &ConnectionId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.queue.push_back(id.clone());
        true
    }

    /// Returns `false` if `id` was not waiting.
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|member| member != id);
        self.queue.len() != before
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.queue.contains(id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionId> {
        self.queue.iter()
    }
}
