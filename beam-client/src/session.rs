use crate::config::SessionConfig;
use crate::error::{MediaError, SessionError};
use crate::machine::{Effect, Negotiation, NegotiationEvent, NegotiationState, TimerKind};
use crate::media::{LocalMedia, MediaSource, media_ended};
use crate::notifier::{Notice, Notifier, TracingNotifier};
use crate::signaling::SignalingLink;
use crate::transport::{
    PeerTransport, SignalSink, TransportFactory, TransportSetup, TransportSignal,
};
use beam_core::{ClientMessage, IceServerConfig, Role, RoomCode, ServerMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What the surrounding application can ask of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Host: acquire media and create a room.
    Start,
    /// Viewer: acquire media if configured and join `room`.
    Join(RoomCode),
    Shutdown,
}

/// Drives a [`Negotiation`] against a relay link, a transport factory and an
/// optional media source.
///
/// Every input is processed to completion before the next one is picked up,
/// so transitions never interleave.
pub struct PeerSession {
    machine: Negotiation,
    config: SessionConfig,
    link: SignalingLink,
    factory: Arc<dyn TransportFactory>,
    notifier: Arc<dyn Notifier>,
    media_source: Option<Arc<dyn MediaSource>>,
    media: Option<LocalMedia>,
    transport: Option<Box<dyn PeerTransport>>,
    /// Pushed by the relay on connect.
    relay_ice_servers: Option<Vec<IceServerConfig>>,
    signal_tx: mpsc::UnboundedSender<TransportSignal>,
    signal_rx: mpsc::UnboundedReceiver<TransportSignal>,
    timer: Option<(Instant, TimerKind)>,
    state_tx: watch::Sender<NegotiationState>,
}

impl PeerSession {
    pub fn new(
        role: Role,
        config: SessionConfig,
        link: SignalingLink,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(NegotiationState::Idle);

        Self {
            machine: Negotiation::new(role, &config),
            config,
            link,
            factory,
            notifier: Arc::new(TracingNotifier),
            media_source: None,
            media: None,
            transport: None,
            relay_ice_servers: None,
            signal_tx,
            signal_rx,
            timer: None,
            state_tx,
        }
    }

    pub fn host(
        config: SessionConfig,
        link: SignalingLink,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self::new(Role::Host, config, link, factory)
    }

    pub fn viewer(
        config: SessionConfig,
        link: SignalingLink,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self::new(Role::Viewer, config, link, factory)
    }

    /// Acquire local media from `source` before every room action.
    pub fn with_media(mut self, source: Arc<dyn MediaSource>) -> Self {
        self.media_source = Some(source);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Follows every state transition.
    pub fn state(&self) -> watch::Receiver<NegotiationState> {
        self.state_tx.subscribe()
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.machine
    }

    /// Runs until the session is closed or `commands` is dropped.
    ///
    /// Losing the relay link tears everything down and returns
    /// [`SessionError::Signaling`].
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<(), SessionError> {
        info!("{:?} session started", self.machine.role());

        loop {
            let ended = self.media.as_ref().map(LocalMedia::ended_signal);
            let deadline = self.timer.map(|(at, _)| at);

            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed. Shutting down session.");
                            self.apply(NegotiationEvent::Shutdown).await;
                            return Ok(());
                        }
                    }
                }

                msg = self.link.inbox.recv() => {
                    match msg {
                        Some(msg) => self.handle_server_message(msg).await,
                        None => {
                            warn!("Relay link closed");
                            self.apply(NegotiationEvent::Shutdown).await;
                            return Err(SessionError::Signaling("relay connection closed".to_owned()));
                        }
                    }
                }

                Some(signal) = self.signal_rx.recv() => {
                    self.apply(NegotiationEvent::Transport(signal)).await;
                }

                _ = async move {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    if let Some((_, kind)) = self.timer.take() {
                        self.apply(NegotiationEvent::TimerFired(kind)).await;
                    }
                }

                _ = media_ended(ended) => {
                    self.apply(NegotiationEvent::MediaEnded).await;
                }
            }

            if self.machine.state() == NegotiationState::Closed {
                info!("Session closed");
                return Ok(());
            }
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        let event = match cmd {
            SessionCommand::Start => NegotiationEvent::Start,
            SessionCommand::Join(room) => NegotiationEvent::Join(room),
            SessionCommand::Shutdown => {
                self.apply(NegotiationEvent::Shutdown).await;
                return;
            }
        };

        let expected = match event {
            NegotiationEvent::Start => Role::Host,
            _ => Role::Viewer,
        };
        if expected == self.machine.role() && self.machine.state().can_start() {
            if let Err(err) = self.acquire_media().await {
                self.apply(NegotiationEvent::MediaFailed(err)).await;
                return;
            }
        }

        self.apply(event).await;
    }

    async fn acquire_media(&mut self) -> Result<(), MediaError> {
        let Some(source) = self.media_source.clone() else {
            return Ok(());
        };
        if self.media.is_some() {
            return Ok(());
        }

        let media = source.acquire().await?;
        info!("Acquired {} local track(s)", media.tracks().len());
        self.media = Some(media);
        Ok(())
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        debug!("Relay -> {}", msg.kind());
        match msg {
            ServerMessage::IceConfig { ice_servers } => {
                info!("Relay provided {} ICE server(s)", ice_servers.len());
                self.relay_ice_servers = Some(ice_servers);
            }
            msg => {
                if let Some(event) = NegotiationEvent::from_server(msg) {
                    self.apply(event).await;
                }
            }
        }
    }

    async fn apply(&mut self, event: NegotiationEvent) {
        let before = self.machine.state();
        let effects = self.machine.handle(event);
        let after = self.machine.state();

        if before != after {
            info!("Negotiation {:?} -> {:?}", before, after);
            self.notifier.state_changed(after);
            let _ = self.state_tx.send(after);
        }

        for effect in effects {
            self.execute(effect).await;
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Send(msg) => self.send(msg),

            Effect::OpenTransport { generation } => {
                self.release_transport().await;

                let setup = TransportSetup {
                    role: self.machine.role(),
                    ice_servers: self
                        .relay_ice_servers
                        .clone()
                        .unwrap_or_else(|| self.config.ice_servers.clone()),
                    tracks: self
                        .media
                        .as_ref()
                        .map(|m| m.tracks().to_vec())
                        .unwrap_or_default(),
                };
                let sink = SignalSink::new(generation, self.signal_tx.clone());

                match self.factory.open(setup, sink.clone()).await {
                    Ok(transport) => {
                        debug!("Opened transport generation {}", generation);
                        self.transport = Some(transport);
                    }
                    Err(e) => {
                        error!("Failed to open transport: {}", e);
                        sink.error(e.to_string());
                    }
                }
            }

            Effect::ReleaseTransport => self.release_transport().await,

            Effect::CreateOffer { target } => {
                let Some(transport) = &self.transport else {
                    warn!("No transport to create an offer on");
                    return;
                };
                match transport.create_offer().await {
                    Ok(sdp) => self.send(ClientMessage::Offer { target, sdp }),
                    Err(e) => self.report_transport_error(e.to_string()),
                }
            }

            Effect::AcceptOffer { target, sdp } => {
                let Some(transport) = &self.transport else {
                    warn!("No transport to accept an offer on");
                    return;
                };
                match transport.accept_offer(sdp).await {
                    Ok(sdp) => self.send(ClientMessage::Answer { target, sdp }),
                    Err(e) => self.report_transport_error(e.to_string()),
                }
            }

            Effect::ApplyAnswer { sdp } => {
                let Some(transport) = &self.transport else {
                    warn!("No transport to apply an answer on");
                    return;
                };
                if let Err(e) = transport.apply_answer(sdp).await {
                    self.report_transport_error(e.to_string());
                }
            }

            Effect::AddCandidate { candidate } => {
                let Some(transport) = &self.transport else {
                    warn!("No transport to add a candidate to");
                    return;
                };
                if let Err(e) = transport.add_candidate(candidate).await {
                    warn!("Failed to add remote candidate: {}", e);
                    self.notifier
                        .notify(&Notice::warning("Error processing ICE candidate"));
                }
            }

            Effect::ArmTimer(timer) => {
                debug!("Arming {:?} in {:?}", timer.kind, timer.delay);
                self.timer = Some((Instant::now() + timer.delay, timer.kind));
            }

            Effect::CancelTimer => self.timer = None,

            Effect::ReleaseMedia => {
                if let Some(media) = self.media.take() {
                    media.stop();
                }
            }

            Effect::Notify(notice) => self.notifier.notify(&notice),

            Effect::RoomReady(room) => self.notifier.room_ready(&room),

            Effect::Fail(err) => self.notifier.failed(&err),
        }
    }

    fn send(&self, msg: ClientMessage) {
        debug!("{} -> relay", msg.kind());
        if self.link.outbox.send(msg).is_err() {
            warn!("Relay link closed, message dropped");
        }
    }

    async fn release_transport(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        if let Err(e) = transport.close().await {
            warn!("Failed to close transport: {}", e);
        }
    }

    /// Routes a failed transport call back through the state machine.
    fn report_transport_error(&self, message: String) {
        error!("Transport call failed: {}", message);
        SignalSink::new(self.machine.generation(), self.signal_tx.clone()).error(message);
    }
}
