use crate::error::SessionError;
use crate::notifier::Notice;
use beam_core::{ClientMessage, ConnectionId, RoomCode};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Grace period after the transport reported an interruption.
    Grace { generation: u64 },
    /// Upper bound for a transport to reach `Connected`.
    Negotiation { generation: u64 },
    /// Backoff before reconnection attempt `attempt`.
    Retry { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub delay: Duration,
}

/// Side effects requested by a transition. The session driver executes them
/// in order.
///
/// A session owns a single timer slot: arming replaces whatever was pending.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(ClientMessage),
    /// Create a transport tagged with `generation`. Any previous one has
    /// already been released by an earlier effect.
    OpenTransport { generation: u64 },
    /// Detach handlers, stop senders and close the current transport.
    ReleaseTransport,
    /// Produce a local offer and send it to `target`.
    CreateOffer { target: ConnectionId },
    /// Apply a remote offer and send the resulting answer to `target`.
    AcceptOffer { target: ConnectionId, sdp: Value },
    ApplyAnswer { sdp: Value },
    AddCandidate { candidate: Value },
    ArmTimer(Timer),
    CancelTimer,
    /// Stop every local track.
    ReleaseMedia,
    Notify(Notice),
    /// The room code to hand to the viewer out of band.
    RoomReady(RoomCode),
    Fail(SessionError),
}
