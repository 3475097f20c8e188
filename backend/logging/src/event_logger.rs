//! Session Event Logger
//!
//! Pairing lifecycle events written through `tracing` on the
//! `session_events` target, so they land in the NDJSON file as structured
//! records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::sanitize::sanitize_display_name;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Connected,
    Waiting {
        display_name: String,
    },
    Paired {
        partner_id: String,
        display_name: String,
        initiator: bool,
    },
    Relayed {
        kind: String,
        to: String,
    },
    Dropped {
        kind: String,
        to: String,
    },
    Left {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionEventEntry {
    pub connection_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl SessionEventEntry {
    /// Build an entry with any free text in `event` sanitised.
    pub fn new(connection_id: &str, mut event: SessionEvent) -> Self {
        match &mut event {
            SessionEvent::Waiting { display_name } | SessionEvent::Paired { display_name, .. } => {
                *display_name = sanitize_display_name(display_name);
            }
            SessionEvent::Left { reason } => {
                *reason = sanitize_display_name(reason);
            }
            SessionEvent::Connected | SessionEvent::Relayed { .. } | SessionEvent::Dropped { .. } => {}
        }

        Self {
            connection_id: connection_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct SessionEventLogger;

impl SessionEventLogger {
    /// Record one lifecycle event for a connection.
    ///
    /// Relay traffic is logged at debug level; everything else at info.
    pub fn log_event(connection_id: &str, event: SessionEvent) {
        let entry = SessionEventEntry::new(connection_id, event);
        match entry.event {
            SessionEvent::Relayed { .. } | SessionEvent::Dropped { .. } => {
                debug!(target: "session_events", event = ?entry, "Session event");
            }
            _ => {
                info!(target: "session_events", event = ?entry, "Session event");
            }
        }
    }
}
