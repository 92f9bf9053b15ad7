use anyhow::{Context, Result};
use beam_client::{
    MediaSource, NegotiationState, PeerSession, RetryPolicy, SessionCommand, SessionConfig,
    SessionError, SignalingLink,
};
use beam_core::{Role, RoomCode};
use beam_server::{ServerConfig, serve};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{MockFactory, RecordingNotifier};

/// Upper bound for any single expectation (ms).
pub const STEP_TIMEOUT_MS: u64 = 5000;

/// Starts a relay on an ephemeral local port.
pub async fn start_relay() -> Result<SocketAddr> {
    start_relay_with(ServerConfig::default()).await
}

pub async fn start_relay_with(config: ServerConfig) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = serve(listener, config).await {
            tracing::error!("Test relay stopped: {:?}", e);
        }
    });

    Ok(addr)
}

/// Short timers so recovery paths finish quickly.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        grace_period: Duration::from_millis(200),
        negotiation_timeout: Duration::from_secs(10),
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(20),
            step: Duration::from_millis(20),
        },
        ..SessionConfig::default()
    }
}

/// A running session and everything a test needs to poke at it.
pub struct TestSession {
    pub commands: mpsc::Sender<SessionCommand>,
    pub state: watch::Receiver<NegotiationState>,
    pub factory: MockFactory,
    pub notes: Arc<RecordingNotifier>,
    pub handle: JoinHandle<Result<(), SessionError>>,
}

impl TestSession {
    pub async fn spawn(
        addr: SocketAddr,
        role: Role,
        factory: MockFactory,
        media: Option<Arc<dyn MediaSource>>,
    ) -> Result<Self> {
        let link = SignalingLink::connect(&format!("ws://{}/ws", addr)).await?;
        let notes = Arc::new(RecordingNotifier::default());

        let mut session = PeerSession::new(role, fast_config(), link, Arc::new(factory.clone()))
            .with_notifier(notes.clone());
        if let Some(media) = media {
            session = session.with_media(media);
        }

        let state = session.state();
        let (commands, command_rx) = mpsc::channel(16);
        let handle = tokio::spawn(session.run(command_rx));

        Ok(Self {
            commands,
            state,
            factory,
            notes,
            handle,
        })
    }

    pub async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.commands
            .send(cmd)
            .await
            .context("Session is no longer running")
    }

    /// Waits until the session reports `target`.
    pub async fn reach(&mut self, target: NegotiationState) -> Result<()> {
        tokio::time::timeout(
            Duration::from_millis(STEP_TIMEOUT_MS),
            self.state.wait_for(|s| *s == target),
        )
        .await
        .with_context(|| format!("Timeout waiting for {:?}", target))?
        .context("Session dropped its state channel")?;
        Ok(())
    }

    /// Waits for the room code a host publishes.
    pub async fn room(&self) -> Result<RoomCode> {
        let notes = self.notes.clone();
        wait_until(move || notes.room().is_some()).await?;
        self.notes.room().context("Room code vanished")
    }
}

/// Polls `cond` until it holds or [`STEP_TIMEOUT_MS`] passes.
pub async fn wait_until(cond: impl Fn() -> bool) -> Result<()> {
    tokio::time::timeout(Duration::from_millis(STEP_TIMEOUT_MS), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("Condition not met in time")
}

/// Host with media and a viewer, both connected over a real relay.
pub async fn connected_pair(
    addr: SocketAddr,
    host_factory: MockFactory,
    viewer_factory: MockFactory,
    media: Arc<dyn MediaSource>,
) -> Result<(TestSession, TestSession)> {
    let mut host = TestSession::spawn(addr, Role::Host, host_factory, Some(media)).await?;
    host.send(SessionCommand::Start).await?;
    let room = host.room().await?;

    let mut viewer = TestSession::spawn(addr, Role::Viewer, viewer_factory, None).await?;
    viewer.send(SessionCommand::Join(room)).await?;

    viewer.reach(NegotiationState::Connected).await?;
    host.reach(NegotiationState::Connected).await?;
    Ok((host, viewer))
}
