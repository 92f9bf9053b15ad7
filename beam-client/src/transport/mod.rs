mod transport_event;
mod webrtc_transport;

pub use transport_event::*;
pub use webrtc_transport::*;

use crate::error::TransportError;
use crate::media::LocalTrack;
use async_trait::async_trait;
use beam_core::{IceServerConfig, Role};
use serde_json::Value;

/// Everything a new transport needs to know up front.
#[derive(Clone)]
pub struct TransportSetup {
    pub role: Role,
    pub ice_servers: Vec<IceServerConfig>,
    /// Local tracks attached before any description is produced.
    pub tracks: Vec<LocalTrack>,
}

/// A peer-to-peer transport as seen by the negotiation layer.
///
/// Descriptions and candidates stay opaque JSON so they can be relayed
/// verbatim.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates a local offer, sets it as the local description and returns it.
    async fn create_offer(&self) -> Result<Value, TransportError>;

    /// Applies a remote offer and returns the local answer.
    async fn accept_offer(&self, offer: Value) -> Result<Value, TransportError>;

    async fn apply_answer(&self, answer: Value) -> Result<(), TransportError>;

    async fn add_candidate(&self, candidate: Value) -> Result<(), TransportError>;

    /// Detaches every handler and releases the underlying connection.
    /// Nothing is reported through the sink afterwards.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Creates transports for a session.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn open(
        &self,
        setup: TransportSetup,
        sink: SignalSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
