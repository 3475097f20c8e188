use std::sync::Arc;

use async_trait::async_trait;

use crate::message::OutboundEvent;
use crate::types::ConnectionId;

/// The transport's per-connection send primitive, as seen by the hub.
///
/// Implementations must not block: hand the event to the connection's
/// writer and return.
#[async_trait]
pub trait Outbox: Send + Sync + 'static {
    /// Deliver `event` to `to`. Returns `false` when that connection is gone.
    async fn deliver(&self, to: &ConnectionId, event: OutboundEvent) -> bool;
}

#[async_trait]
impl<T: Outbox + ?Sized> Outbox for Arc<T> {
    async fn deliver(&self, to: &ConnectionId, event: OutboundEvent) -> bool {
        (**self).deliver(to, event).await
    }
}
