use crate::error::SessionError;
use crate::machine::NegotiationState;
use beam_core::RoomCode;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A short user-facing message, the kind a page shows as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Write-only sink for everything the user should see.
///
/// Calls must not block; the session never waits on the UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);

    fn state_changed(&self, _state: NegotiationState) {}

    /// A room was created and its code can be shared.
    fn room_ready(&self, _room: &RoomCode) {}

    fn failed(&self, error: &SessionError);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice.text),
            NoticeLevel::Warning => warn!("{}", notice.text),
            NoticeLevel::Error => error!("{}", notice.text),
        }
    }

    fn state_changed(&self, state: NegotiationState) {
        info!("Session state: {:?}", state);
    }

    fn room_ready(&self, room: &RoomCode) {
        info!("Share this room code with the viewer: {}", room);
    }

    fn failed(&self, err: &SessionError) {
        error!("Session failed: {}", err);
    }
}
