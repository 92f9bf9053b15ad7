/// Lifecycle of one negotiation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    /// No transport and no room action in flight.
    Idle,
    /// Room action sent; waiting for the counter-party.
    AwaitingPeer,
    Negotiating,
    Connected,
    /// Interrupted; the grace timer decides whether this becomes a retry.
    Disconnected,
    /// Previous transport released, next attempt scheduled.
    Reconnecting,
    Failed,
    Closed,
}

impl NegotiationState {
    /// States from which a new room action may begin.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Failed | Self::Closed)
    }

    /// States that keep a counter-party attached.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Negotiating | Self::Connected | Self::Disconnected | Self::Reconnecting
        )
    }

    /// States in which a remote candidate may be applied.
    pub fn accepts_candidates(self) -> bool {
        matches!(
            self,
            Self::Negotiating | Self::Connected | Self::Disconnected
        )
    }
}
