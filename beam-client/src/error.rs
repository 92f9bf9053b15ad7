use thiserror::Error;

/// Conditions surfaced to the user. None of them is retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("room not found")]
    RoomNotFound,

    #[error("room already has a viewer")]
    RoomFull,

    #[error("screen capture permission denied")]
    MediaAcquisitionDenied,

    #[error("screen capture unavailable: {0}")]
    MediaUnavailable(String),

    #[error("gave up after {attempts} reconnection attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("signaling link lost: {0}")]
    Signaling(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission denied")]
    Denied,

    #[error("{0}")]
    Unavailable(String),
}

impl From<MediaError> for SessionError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Denied => Self::MediaAcquisitionDenied,
            MediaError::Unavailable(reason) => Self::MediaUnavailable(reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("transport closed")]
    Closed,
}
