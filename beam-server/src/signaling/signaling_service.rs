use crate::relay::{Relay, RelayCommand};
use anyhow::{Context, Result};
use beam_core::{ClientMessage, ConnectionId, IceServerConfig, ServerMessage};
use tokio::sync::{mpsc, oneshot};

/// Handle the WebSocket layer uses to talk to the relay loop.
#[derive(Clone)]
pub struct SignalingService {
    relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_tx: mpsc::Sender<RelayCommand>) -> Self {
        Self { relay_tx }
    }

    /// Starts a relay loop on the current runtime and returns a handle to it.
    pub fn spawn(ice_servers: Vec<IceServerConfig>) -> Self {
        let (relay_tx, relay_rx) = mpsc::channel(256);
        tokio::spawn(Relay::new(ice_servers).run(relay_rx));
        Self::new(relay_tx)
    }

    pub async fn connect(
        &self,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId> {
        let (reply, id_rx) = oneshot::channel();
        self.relay_tx
            .send(RelayCommand::Connect { outbox, reply })
            .await
            .context("Relay is not running")?;
        id_rx.await.context("Relay dropped the connect request")
    }

    pub async fn forward(&self, from: ConnectionId, message: ClientMessage) -> Result<()> {
        self.relay_tx
            .send(RelayCommand::Message { from, message })
            .await
            .context("Relay is not running")
    }

    pub async fn disconnect(&self, id: ConnectionId) {
        let _ = self.relay_tx.send(RelayCommand::Disconnect { id }).await;
    }
}
