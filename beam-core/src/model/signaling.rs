use crate::model::connection::ConnectionId;
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    pub fn turn(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    /// Whether the url points at a relay server, which needs credentials.
    pub fn is_turn_url(url: &str) -> bool {
        url.starts_with("turn:") || url.starts_with("turns:")
    }
}

/// Messages a client sends to the relay.
///
/// Session descriptions and candidates are carried as opaque JSON; only
/// `target` is ever looked at on the way through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        room: RoomCode,
    },
    Offer {
        target: ConnectionId,
        sdp: Value,
    },
    Answer {
        target: ConnectionId,
        sdp: Value,
    },
    IceCandidate {
        target: ConnectionId,
        candidate: Value,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
        }
    }

    /// Splits a negotiation message into its target and the message the
    /// target receives, stamped with `sender`. Room actions yield `None`.
    pub fn into_relayed(self, sender: ConnectionId) -> Option<(ConnectionId, ServerMessage)> {
        match self {
            Self::Offer { target, sdp } => Some((target, ServerMessage::Offer { sender, sdp })),
            Self::Answer { target, sdp } => Some((target, ServerMessage::Answer { sender, sdp })),
            Self::IceCandidate { target, candidate } => Some((
                target,
                ServerMessage::IceCandidate { sender, candidate },
            )),
            Self::CreateRoom | Self::JoinRoom { .. } => None,
        }
    }
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    RoomCreated {
        room: RoomCode,
    },
    JoinedRoom {
        host: ConnectionId,
    },
    RoomNotFound,
    RoomFull,
    ViewerJoined {
        viewer: ConnectionId,
    },
    ViewerLeft {
        viewer: ConnectionId,
    },
    Offer {
        sender: ConnectionId,
        sdp: Value,
    },
    Answer {
        sender: ConnectionId,
        sdp: Value,
    },
    IceCandidate {
        sender: ConnectionId,
        candidate: Value,
    },
    HostDisconnected,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IceConfig { .. } => "ice-config",
            Self::RoomCreated { .. } => "room-created",
            Self::JoinedRoom { .. } => "joined-room",
            Self::RoomNotFound => "room-not-found",
            Self::RoomFull => "room-full",
            Self::ViewerJoined { .. } => "viewer-joined",
            Self::ViewerLeft { .. } => "viewer-left",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::HostDisconnected => "host-disconnected",
        }
    }
}
