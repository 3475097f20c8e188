//! tandem WebSocket gateway.
//!
//! Accepts signaling sockets, feeds their events to the signal hub, and
//! exposes health and status endpoints.

pub mod health_api;
pub mod server;
pub mod session_registry;
pub mod ws_protocol;
pub mod ws_server;

pub use server::{GatewayState, build_router, start_server};
pub use session_registry::SessionRegistry;
