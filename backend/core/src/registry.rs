//! Connection Registry.
//!
//! Maps each live connection to its advisory profile.

use std::collections::HashMap;

use crate::types::{ConnectionId, Profile};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    profiles: HashMap<ConnectionId, Profile>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the profile for `id`. Blank names become the default.
    pub fn set_profile(&mut self, id: &ConnectionId, display_name: Option<&str>) -> &Profile {
        let profile = Profile::from_display_name(display_name);
        self.profiles.insert(id.clone(), profile);
        &self.profiles[id]
    }

    /// Profile for `id`, or the default profile when none was ever set.
    pub fn get_profile(&self, id: &ConnectionId) -> Profile {
        self.profiles.get(id).cloned().unwrap_or_default()
    }

    /// Forget `id`. No-op if it was never registered.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Profile> {
        self.profiles.remove(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
