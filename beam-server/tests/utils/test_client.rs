use anyhow::{Context, Result};
use beam_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

/// A bare WebSocket client speaking the relay protocol.
pub struct TestClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connects and consumes the `ice-config` greeting.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (socket, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .context("Failed to open WebSocket")?;
        let mut client = Self { socket };

        match client.recv().await? {
            ServerMessage::IceConfig { .. } => Ok(client),
            other => anyhow::bail!("Expected ice-config greeting, got {:?}", other),
        }
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.socket
            .send(Message::Text(json))
            .await
            .context("Failed to send message")
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::Text(text.to_owned()))
            .await
            .context("Failed to send raw text")
    }

    /// Next relay message, failing after [`SIGNAL_TIMEOUT_MS`].
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let next = tokio::time::timeout(timeout, self.socket.next())
                .await
                .context("Timeout waiting for relay message")?;

            match next {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).context("Relay sent invalid JSON");
                }
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("Socket closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// True if nothing arrives within `ms`.
    pub async fn is_silent_for(&mut self, ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(ms), self.socket.next())
            .await
            .is_err()
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.context("Failed to close socket")
    }
}
