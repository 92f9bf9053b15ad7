use beam_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::{mpsc, oneshot};

/// Events fed into the relay loop by the WebSocket layer.
#[derive(Debug)]
pub enum RelayCommand {
    /// A socket opened. The relay replies with the id it assigned.
    Connect {
        outbox: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<ConnectionId>,
    },

    /// A well-formed message arrived on `from`'s socket.
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },

    /// `id`'s socket closed.
    Disconnect { id: ConnectionId },
}
