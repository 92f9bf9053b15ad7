use crate::error::MediaError;
use crate::machine::TimerKind;
use crate::transport::TransportSignal;
use beam_core::{ConnectionId, RoomCode, ServerMessage};
use serde_json::Value;

/// Everything that can move a negotiation forward.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationEvent {
    /// Host asks for a new room.
    Start,
    /// Viewer submits a room code.
    Join(RoomCode),
    /// Local capture could not be acquired before the room action.
    MediaFailed(MediaError),

    RoomCreated(RoomCode),
    JoinedRoom { host: ConnectionId },
    RoomNotFound,
    RoomFull,
    ViewerJoined { viewer: ConnectionId },
    ViewerLeft { viewer: ConnectionId },
    HostDisconnected,
    RemoteOffer { sender: ConnectionId, sdp: Value },
    RemoteAnswer { sender: ConnectionId, sdp: Value },
    RemoteCandidate { sender: ConnectionId, candidate: Value },

    Transport(TransportSignal),
    TimerFired(TimerKind),
    MediaEnded,
    Shutdown,
}

impl NegotiationEvent {
    /// Maps a relay message onto the state machine. Configuration pushes
    /// have no transition and yield `None`.
    pub fn from_server(message: ServerMessage) -> Option<Self> {
        let event = match message {
            ServerMessage::IceConfig { .. } => return None,
            ServerMessage::RoomCreated { room } => Self::RoomCreated(room),
            ServerMessage::JoinedRoom { host } => Self::JoinedRoom { host },
            ServerMessage::RoomNotFound => Self::RoomNotFound,
            ServerMessage::RoomFull => Self::RoomFull,
            ServerMessage::ViewerJoined { viewer } => Self::ViewerJoined { viewer },
            ServerMessage::ViewerLeft { viewer } => Self::ViewerLeft { viewer },
            ServerMessage::HostDisconnected => Self::HostDisconnected,
            ServerMessage::Offer { sender, sdp } => Self::RemoteOffer { sender, sdp },
            ServerMessage::Answer { sender, sdp } => Self::RemoteAnswer { sender, sdp },
            ServerMessage::IceCandidate { sender, candidate } => {
                Self::RemoteCandidate { sender, candidate }
            }
        };
        Some(event)
    }
}
