use crate::error::TransportError;
use crate::transport::{
    PeerTransport, SignalSink, TransportFactory, TransportSetup, TransportState,
};
use async_trait::async_trait;
use beam_core::{IceServerConfig, Role};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Opens `webrtc` peer connections.
#[derive(Default, Clone)]
pub struct WebRtcTransportFactory {
    remote_tracks: Option<mpsc::UnboundedSender<Arc<TrackRemote>>>,
}

impl WebRtcTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards every incoming remote track to `tx`, e.g. for playback.
    pub fn with_remote_tracks(mut self, tx: mpsc::UnboundedSender<Arc<TrackRemote>>) -> Self {
        self.remote_tracks = Some(tx);
        self
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn open(
        &self,
        setup: TransportSetup,
        sink: SignalSink,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(setup, sink, self.remote_tracks.clone()).await?;
        Ok(Box::new(transport))
    }
}

pub struct WebRtcTransport {
    generation: u64,
    peer_connection: Arc<RTCPeerConnection>,
    closed: AtomicBool,
}

impl WebRtcTransport {
    pub async fn new(
        setup: TransportSetup,
        sink: SignalSink,
        remote_tracks: Option<mpsc::UnboundedSender<Arc<TrackRemote>>>,
    ) -> Result<Self, TransportError> {
        let generation = sink.generation();

        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: setup.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in &setup.tracks {
            let sender = peer_connection.add_track(track.clone()).await?;
            // RTCP has to be drained for the interceptors to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }

        if setup.tracks.is_empty() && setup.role == Role::Viewer {
            peer_connection
                .add_transceiver_from_kind(
                    RTPCodecType::Video,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }

        let state_sink = sink.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let sink = state_sink.clone();
                Box::pin(async move {
                    info!(
                        "Peer connection state changed for generation {}: {:?}",
                        sink.generation(),
                        s
                    );
                    if let Some(state) = map_state(s) {
                        sink.state(state);
                    }
                })
            },
        ));

        let ice_sink = sink.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        sink.error(format!("failed to encode local candidate: {e}"));
                        return;
                    }
                };
                match serde_json::to_value(init) {
                    Ok(value) => sink.candidate(value),
                    Err(e) => sink.error(format!("failed to encode local candidate: {e}")),
                }
            })
        }));

        if let Some(tx) = remote_tracks {
            peer_connection.on_track(Box::new(
                move |track: Arc<TrackRemote>,
                      _receiver: Arc<RTCRtpReceiver>,
                      _transceiver: Arc<RTCRtpTransceiver>| {
                    let tx = tx.clone();
                    Box::pin(async move {
                        debug!("Remote {:?} track {}", track.kind(), track.id());
                        let _ = tx.send(track);
                    })
                },
            ));
        }

        Ok(Self {
            generation,
            peer_connection,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<Value, TransportError> {
        self.ensure_open()?;
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(serde_json::to_value(offer)?)
    }

    async fn accept_offer(&self, offer: Value) -> Result<Value, TransportError> {
        self.ensure_open()?;
        let desc: RTCSessionDescription = serde_json::from_value(offer)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(serde_json::to_value(answer)?)
    }

    async fn apply_answer(&self, answer: Value) -> Result<(), TransportError> {
        self.ensure_open()?;
        let desc: RTCSessionDescription = serde_json::from_value(answer)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: Value) -> Result<(), TransportError> {
        self.ensure_open()?;
        let init: RTCIceCandidateInit = serde_json::from_value(candidate)?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("Closing transport generation {}", self.generation);

        // Late callbacks from this connection must not reach the session.
        self.peer_connection
            .on_peer_connection_state_change(Box::new(|_: RTCPeerConnectionState| {
                Box::pin(async {})
            }));
        self.peer_connection
            .on_ice_candidate(Box::new(|_: Option<RTCIceCandidate>| Box::pin(async {})));
        self.peer_connection.on_track(Box::new(
            |_: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                Box::pin(async {})
            },
        ));

        for sender in self.peer_connection.get_senders().await {
            if let Err(e) = sender.stop().await {
                warn!("Failed to stop sender: {}", e);
            }
        }

        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn map_state(state: RTCPeerConnectionState) -> Option<TransportState> {
    match state {
        RTCPeerConnectionState::New => Some(TransportState::New),
        RTCPeerConnectionState::Connecting => Some(TransportState::Connecting),
        RTCPeerConnectionState::Connected => Some(TransportState::Connected),
        RTCPeerConnectionState::Disconnected => Some(TransportState::Disconnected),
        RTCPeerConnectionState::Failed => Some(TransportState::Failed),
        RTCPeerConnectionState::Closed => Some(TransportState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}
