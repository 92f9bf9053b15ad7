use anyhow::{Context, Result};
use beam_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Both directions of a relay connection, already decoded.
///
/// The link is closed once `inbox` yields `None`.
pub struct SignalingLink {
    pub outbox: mpsc::UnboundedSender<ClientMessage>,
    pub inbox: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Relay side of an in-process link.
pub struct RelayEnd {
    pub from_client: mpsc::UnboundedReceiver<ClientMessage>,
    pub to_client: mpsc::UnboundedSender<ServerMessage>,
}

impl SignalingLink {
    /// In-process link, handy for embedding and tests.
    pub fn channel() -> (Self, RelayEnd) {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (server_tx, server_rx) = mpsc::unbounded_channel();

        let link = Self {
            outbox: client_tx,
            inbox: server_rx,
        };
        let relay = RelayEnd {
            from_client: client_rx,
            to_client: server_tx,
        };
        (link, relay)
    }

    /// Opens a WebSocket to the relay at `url` (e.g. `ws://host:3000/ws`).
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {url}"))?;
        info!("Connected to relay at {}", url);

        let (mut sender, mut receiver) = socket.split();
        let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbox_tx, inbox) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbox_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {}: {}", msg.kind(), e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(frame)) = receiver.next().await {
                match frame {
                    Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            debug!("Relay -> {}", msg.kind());
                            if inbox_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Ignoring malformed relay message: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay connection closed");
        });

        Ok(Self { outbox, inbox })
    }
}
