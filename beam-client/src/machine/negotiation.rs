use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::machine::{Effect, NegotiationEvent, NegotiationState, Timer, TimerKind};
use crate::notifier::Notice;
use crate::supervisor::ReconnectSupervisor;
use crate::transport::{TransportSignal, TransportSignalKind, TransportState};
use beam_core::{ClientMessage, ConnectionId, Role, RoomCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Client-side negotiation for one local peer.
///
/// `handle` is a pure transition: it mutates only this struct and returns the
/// effects the driver must run. Nothing here touches a socket or a transport.
#[derive(Debug, Clone)]
pub struct Negotiation {
    role: Role,
    state: NegotiationState,
    room: Option<RoomCode>,
    remote: Option<ConnectionId>,
    /// Bumped for every transport; signals and timers from older ones are stale.
    generation: u64,
    has_transport: bool,
    /// The current transport has its remote description set.
    remote_described: bool,
    supervisor: ReconnectSupervisor,
    grace_period: Duration,
    negotiation_timeout: Duration,
}

impl Negotiation {
    pub fn new(role: Role, config: &SessionConfig) -> Self {
        Self {
            role,
            state: NegotiationState::Idle,
            room: None,
            remote: None,
            generation: 0,
            has_transport: false,
            remote_described: false,
            supervisor: ReconnectSupervisor::new(config.retry),
            grace_period: config.grace_period,
            negotiation_timeout: config.negotiation_timeout,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    pub fn remote(&self) -> Option<ConnectionId> {
        self.remote
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_transport(&self) -> bool {
        self.has_transport
    }

    pub fn attempt(&self) -> u32 {
        self.supervisor.attempt()
    }

    pub fn handle(&mut self, event: NegotiationEvent) -> Vec<Effect> {
        let mut fx = Vec::new();

        match event {
            NegotiationEvent::Start => self.on_start(&mut fx),
            NegotiationEvent::Join(room) => self.on_join(room, &mut fx),
            NegotiationEvent::MediaFailed(err) => {
                warn!("Local media unavailable: {}", err);
                let err = SessionError::from(err);
                fx.push(Effect::Notify(Notice::error(err.to_string())));
                fx.push(Effect::Fail(err));
            }
            NegotiationEvent::RoomCreated(room) => self.on_room_created(room, &mut fx),
            NegotiationEvent::JoinedRoom { host } => self.on_joined_room(host, &mut fx),
            NegotiationEvent::RoomNotFound => {
                self.on_join_rejected(SessionError::RoomNotFound, &mut fx)
            }
            NegotiationEvent::RoomFull => self.on_join_rejected(SessionError::RoomFull, &mut fx),
            NegotiationEvent::ViewerJoined { viewer } => self.on_viewer_joined(viewer, &mut fx),
            NegotiationEvent::ViewerLeft { viewer } => self.on_viewer_left(viewer, &mut fx),
            NegotiationEvent::HostDisconnected => self.on_host_disconnected(&mut fx),
            NegotiationEvent::RemoteOffer { sender, sdp } => self.on_offer(sender, sdp, &mut fx),
            NegotiationEvent::RemoteAnswer { sender, sdp } => {
                self.on_answer(sender, sdp, &mut fx)
            }
            NegotiationEvent::RemoteCandidate { sender, candidate } => {
                self.on_candidate(sender, candidate, &mut fx)
            }
            NegotiationEvent::Transport(signal) => self.on_transport(signal, &mut fx),
            NegotiationEvent::TimerFired(kind) => self.on_timer(kind, &mut fx),
            NegotiationEvent::MediaEnded => {
                if self.state != NegotiationState::Closed {
                    info!("Local media ended");
                    self.close(Notice::info("Screen sharing ended"), &mut fx);
                }
            }
            NegotiationEvent::Shutdown => {
                if self.state != NegotiationState::Closed {
                    self.close(Notice::info("Session closed"), &mut fx);
                }
            }
        }

        fx
    }

    fn on_start(&mut self, fx: &mut Vec<Effect>) {
        if self.role != Role::Host {
            warn!("Only a host can create a room");
            return;
        }
        if !self.state.can_start() {
            warn!("Ignoring start while {:?}", self.state);
            return;
        }

        self.reset_session();
        self.state = NegotiationState::AwaitingPeer;
        fx.push(Effect::Send(ClientMessage::CreateRoom));
        fx.push(Effect::Notify(Notice::info("Creating room...")));
    }

    fn on_join(&mut self, room: RoomCode, fx: &mut Vec<Effect>) {
        if self.role != Role::Viewer {
            warn!("A host cannot join a room");
            return;
        }
        if !self.state.can_start() {
            warn!("Ignoring join while {:?}", self.state);
            return;
        }

        self.reset_session();
        info!("Joining room {}", room);
        self.room = Some(room.clone());
        self.state = NegotiationState::AwaitingPeer;
        fx.push(Effect::Send(ClientMessage::JoinRoom { room }));
        fx.push(Effect::Notify(Notice::info("Connecting to room...")));
    }

    fn on_room_created(&mut self, room: RoomCode, fx: &mut Vec<Effect>) {
        if self.role != Role::Host || self.state != NegotiationState::AwaitingPeer {
            warn!("Unexpected room-created while {:?}", self.state);
            return;
        }

        info!("Room {} created", room);
        fx.push(Effect::Notify(Notice::success(format!(
            "Room {room} ready. Waiting for a viewer..."
        ))));
        fx.push(Effect::RoomReady(room.clone()));
        self.room = Some(room);
    }

    fn on_joined_room(&mut self, host: ConnectionId, fx: &mut Vec<Effect>) {
        if self.role != Role::Viewer || self.state != NegotiationState::AwaitingPeer {
            warn!("Unexpected joined-room while {:?}", self.state);
            return;
        }

        info!("Paired with host {}", host);
        self.remote = Some(host);
        fx.push(Effect::Notify(Notice::info(
            "Room found! Setting up connection...",
        )));
        self.open_transport(fx);
        fx.push(Effect::CreateOffer { target: host });
        self.enter_negotiating(fx);
    }

    fn on_join_rejected(&mut self, err: SessionError, fx: &mut Vec<Effect>) {
        if self.role != Role::Viewer || self.state != NegotiationState::AwaitingPeer {
            warn!("Unexpected join rejection while {:?}", self.state);
            return;
        }

        warn!("Join rejected: {}", err);
        self.room = None;
        self.state = NegotiationState::Idle;
        fx.push(Effect::ReleaseMedia);
        fx.push(Effect::Notify(Notice::error(match err {
            SessionError::RoomFull => "Room already has a viewer",
            _ => "Room not found",
        })));
        fx.push(Effect::Fail(err));
    }

    fn on_viewer_joined(&mut self, viewer: ConnectionId, fx: &mut Vec<Effect>) {
        let accepting = self.state == NegotiationState::AwaitingPeer || self.state.is_active();
        if self.role != Role::Host || !accepting {
            warn!("Unexpected viewer-joined while {:?}", self.state);
            return;
        }

        info!("Viewer {} joined", viewer);
        fx.push(Effect::CancelTimer);
        self.remote = Some(viewer);
        self.supervisor.reset();
        fx.push(Effect::Notify(Notice::info("Someone is connecting...")));
        self.open_transport(fx);
        self.enter_negotiating(fx);
    }

    fn on_viewer_left(&mut self, viewer: ConnectionId, fx: &mut Vec<Effect>) {
        if self.role != Role::Host || self.remote != Some(viewer) {
            debug!("Ignoring viewer-left for {}", viewer);
            return;
        }

        info!("Viewer {} left", viewer);
        fx.push(Effect::CancelTimer);
        self.release_transport(fx);
        self.remote = None;
        self.supervisor.reset();
        self.state = NegotiationState::AwaitingPeer;
        fx.push(Effect::Notify(Notice::warning(
            "Viewer left. Waiting for a new viewer...",
        )));
    }

    fn on_host_disconnected(&mut self, fx: &mut Vec<Effect>) {
        let paired = self.state == NegotiationState::AwaitingPeer || self.state.is_active();
        if self.role != Role::Viewer || !paired {
            debug!("Ignoring host-disconnected while {:?}", self.state);
            return;
        }

        info!("Host ended the session");
        fx.push(Effect::CancelTimer);
        self.release_transport(fx);
        fx.push(Effect::ReleaseMedia);
        self.remote = None;
        self.room = None;
        self.supervisor.reset();
        self.state = NegotiationState::Idle;
        fx.push(Effect::Notify(Notice::warning("Host ended the session")));
    }

    fn on_offer(&mut self, sender: ConnectionId, sdp: Value, fx: &mut Vec<Effect>) {
        if self.role != Role::Host || self.remote != Some(sender) {
            warn!("Discarding offer from unexpected sender {}", sender);
            return;
        }

        match self.state {
            NegotiationState::Negotiating if self.has_transport && !self.remote_described => {
                self.remote_described = true;
                fx.push(Effect::AcceptOffer {
                    target: sender,
                    sdp,
                });
            }
            NegotiationState::Negotiating
            | NegotiationState::Connected
            | NegotiationState::Disconnected
            | NegotiationState::Reconnecting => {
                // The viewer restarted with a fresh transport; follow it.
                info!("Viewer {} renegotiating", sender);
                fx.push(Effect::CancelTimer);
                self.open_transport(fx);
                self.remote_described = true;
                fx.push(Effect::AcceptOffer {
                    target: sender,
                    sdp,
                });
                self.enter_negotiating(fx);
            }
            state => warn!("Discarding offer while {:?}", state),
        }
    }

    fn on_answer(&mut self, sender: ConnectionId, sdp: Value, fx: &mut Vec<Effect>) {
        if self.role != Role::Viewer || self.remote != Some(sender) {
            warn!("Discarding answer from unexpected sender {}", sender);
            return;
        }
        if self.state != NegotiationState::Negotiating
            || !self.has_transport
            || self.remote_described
        {
            warn!("Discarding answer while {:?}", self.state);
            return;
        }

        self.remote_described = true;
        fx.push(Effect::ApplyAnswer { sdp });
    }

    fn on_candidate(&mut self, sender: ConnectionId, candidate: Value, fx: &mut Vec<Effect>) {
        if self.remote != Some(sender) {
            warn!("Discarding candidate from unexpected sender {}", sender);
            return;
        }
        if !self.has_transport || !self.remote_described || !self.state.accepts_candidates() {
            warn!("Discarding candidate while {:?}", self.state);
            return;
        }

        fx.push(Effect::AddCandidate { candidate });
    }

    fn on_transport(&mut self, signal: TransportSignal, fx: &mut Vec<Effect>) {
        if signal.generation != self.generation || !self.has_transport {
            debug!(
                "Ignoring signal from stale transport generation {}",
                signal.generation
            );
            return;
        }

        match signal.kind {
            TransportSignalKind::LocalCandidate(candidate) => {
                if let Some(target) = self.remote {
                    fx.push(Effect::Send(ClientMessage::IceCandidate { target, candidate }));
                }
            }
            TransportSignalKind::StateChanged(state) => self.on_transport_state(state, fx),
            TransportSignalKind::Error(message) => {
                error!("Transport error: {}", message);
                if self.state.accepts_candidates() {
                    fx.push(Effect::Notify(Notice::error("Connection error")));
                    self.enter_reconnecting(fx);
                }
            }
        }
    }

    fn on_transport_state(&mut self, state: TransportState, fx: &mut Vec<Effect>) {
        match state {
            TransportState::Connected => {
                if !matches!(
                    self.state,
                    NegotiationState::Negotiating | NegotiationState::Disconnected
                ) {
                    return;
                }
                info!("Transport connected");
                self.state = NegotiationState::Connected;
                self.supervisor.reset();
                fx.push(Effect::CancelTimer);
                fx.push(Effect::Notify(Notice::success(match self.role {
                    Role::Host => "Connected! Sharing screen",
                    Role::Viewer => "Connected! Receiving stream",
                })));
            }
            TransportState::Disconnected => {
                if !matches!(
                    self.state,
                    NegotiationState::Negotiating | NegotiationState::Connected
                ) {
                    return;
                }
                warn!("Transport interrupted, waiting {:?}", self.grace_period);
                self.state = NegotiationState::Disconnected;
                fx.push(Effect::ArmTimer(Timer {
                    kind: TimerKind::Grace {
                        generation: self.generation,
                    },
                    delay: self.grace_period,
                }));
                fx.push(Effect::Notify(Notice::warning("Connection lost")));
            }
            TransportState::Failed | TransportState::Closed => {
                if !self.state.accepts_candidates() {
                    return;
                }
                error!("Transport {:?}", state);
                fx.push(Effect::Notify(Notice::error("Connection error")));
                self.enter_reconnecting(fx);
            }
            TransportState::New | TransportState::Connecting => {
                debug!("Transport {:?}", state);
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind, fx: &mut Vec<Effect>) {
        match kind {
            TimerKind::Grace { generation } => {
                if generation == self.generation && self.state == NegotiationState::Disconnected {
                    warn!("Transport did not recover within the grace period");
                    self.enter_reconnecting(fx);
                }
            }
            TimerKind::Negotiation { generation } => {
                if generation == self.generation && self.state == NegotiationState::Negotiating {
                    warn!("Negotiation timed out");
                    self.enter_reconnecting(fx);
                }
            }
            TimerKind::Retry { attempt } => {
                if self.state == NegotiationState::Reconnecting
                    && self.supervisor.is_current(attempt)
                {
                    self.retry(fx);
                }
            }
        }
    }

    fn retry(&mut self, fx: &mut Vec<Effect>) {
        let Some(remote) = self.remote else {
            self.state = match self.role {
                Role::Host => NegotiationState::AwaitingPeer,
                Role::Viewer => NegotiationState::Idle,
            };
            return;
        };

        info!("Reconnection attempt {}", self.supervisor.attempt());
        fx.push(Effect::Notify(Notice::info("Establishing connection...")));
        self.open_transport(fx);
        if self.role == Role::Viewer {
            fx.push(Effect::CreateOffer { target: remote });
        }
        self.enter_negotiating(fx);
    }

    fn enter_negotiating(&mut self, fx: &mut Vec<Effect>) {
        self.state = NegotiationState::Negotiating;
        fx.push(Effect::ArmTimer(Timer {
            kind: TimerKind::Negotiation {
                generation: self.generation,
            },
            delay: self.negotiation_timeout,
        }));
    }

    fn enter_reconnecting(&mut self, fx: &mut Vec<Effect>) {
        // The supervisor emits the release itself.
        self.has_transport = false;
        self.remote_described = false;

        let recovery = self.supervisor.begin();
        self.state = recovery.state;
        fx.extend(recovery.effects);

        if self.state == NegotiationState::Failed {
            self.remote = None;
            self.room = None;
        }
    }

    fn open_transport(&mut self, fx: &mut Vec<Effect>) {
        self.release_transport(fx);
        self.generation += 1;
        self.has_transport = true;
        self.remote_described = false;
        fx.push(Effect::OpenTransport {
            generation: self.generation,
        });
    }

    fn release_transport(&mut self, fx: &mut Vec<Effect>) {
        if self.has_transport {
            fx.push(Effect::ReleaseTransport);
        }
        self.has_transport = false;
        self.remote_described = false;
    }

    fn close(&mut self, notice: Notice, fx: &mut Vec<Effect>) {
        fx.push(Effect::CancelTimer);
        self.release_transport(fx);
        fx.push(Effect::ReleaseMedia);
        self.remote = None;
        self.room = None;
        self.state = NegotiationState::Closed;
        fx.push(Effect::Notify(notice));
    }

    fn reset_session(&mut self) {
        self.room = None;
        self.remote = None;
        self.supervisor.reset();
    }
}
