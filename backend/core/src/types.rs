use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used whenever a connection has not supplied one.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Display names are advisory labels; anything longer is cut at this many chars.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Opaque, transport-assigned identity of a live connection.
///
/// Only meaningful for the lifetime of the process. Clients address each
/// other with it, so it is carried on the wire as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Mint a fresh identity for a newly accepted connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Advisory, untrusted profile attached to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "userName", default = "default_display_name")]
    pub display_name: String,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

impl Profile {
    /// Build a profile from a client-supplied name, falling back to the default.
    pub fn from_display_name(raw: Option<&str>) -> Self {
        Self {
            display_name: normalize_display_name(raw),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
        }
    }
}

/// Trim a client-supplied name, default it when blank and cap its length.
pub fn normalize_display_name(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return default_display_name();
    }
    trimmed.chars().take(MAX_DISPLAY_NAME_CHARS).collect()
}

/// Lifecycle of a connection as seen by the hub.
///
/// A disconnected connection has no state at all: it is removed from
/// every table the moment the transport reports it gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Connected, nothing heard from it yet.
    Unregistered,
    /// Has a profile, not looking for anyone.
    Idle,
    /// Sitting in the waiting pool.
    Searching,
    /// Matched with a partner.
    Paired,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Unregistered => "unregistered",
            ConnectionState::Idle => "idle",
            ConnectionState::Searching => "searching",
            ConnectionState::Paired => "paired",
        };
        f.write_str(s)
    }
}
