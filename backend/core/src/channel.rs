use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::SignalError;
use crate::hub::{HubSnapshot, SignalHub};
use crate::message::InboundEvent;
use crate::traits::Outbox;
use crate::types::ConnectionId;

/// Default depth of the hub's command queue.
pub const DEFAULT_HUB_BUFFER: usize = 1024;

/// Work items for the hub task, processed strictly one at a time.
#[derive(Debug)]
pub enum HubCommand {
    Connect {
        id: ConnectionId,
    },
    Event {
        from: ConnectionId,
        event: InboundEvent,
    },
    Disconnect {
        id: ConnectionId,
        reason: String,
    },
    Snapshot {
        reply: oneshot::Sender<HubSnapshot>,
    },
}

/// Cloneable sender side of the hub.
///
/// Every connection task holds one; the hub task owns all state.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    pub async fn connect(&self, id: ConnectionId) -> Result<(), SignalError> {
        self.send(HubCommand::Connect { id }).await
    }

    pub async fn submit(&self, from: ConnectionId, event: InboundEvent) -> Result<(), SignalError> {
        self.send(HubCommand::Event { from, event }).await
    }

    pub async fn disconnect(
        &self,
        id: ConnectionId,
        reason: impl Into<String>,
    ) -> Result<(), SignalError> {
        self.send(HubCommand::Disconnect {
            id,
            reason: reason.into(),
        })
        .await
    }

    /// Current counters, read between two commands.
    pub async fn snapshot(&self) -> Result<HubSnapshot, SignalError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SignalError::HubUnavailable)
    }

    async fn send(&self, command: HubCommand) -> Result<(), SignalError> {
        self.tx.send(command).await.map_err(|_| {
            debug!("Hub command queue closed");
            SignalError::HubUnavailable
        })
    }
}

/// Move `hub` onto its own task and return a handle to it.
///
/// The task ends once every handle has been dropped.
pub fn spawn_hub<O: Outbox>(hub: SignalHub<O>, buffer: usize) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer);
    let task = tokio::spawn(hub.run(rx));
    (HubHandle::new(tx), task)
}
