//! Structured logging for tandem.
//!
//! Console and rolling NDJSON output, display-name sanitisation, and the
//! session event log.

pub mod event_logger;
pub mod logger;
pub mod sanitize;

pub use event_logger::{SessionEvent, SessionEventEntry, SessionEventLogger};
pub use logger::init_logger;
pub use sanitize::sanitize_display_name;
