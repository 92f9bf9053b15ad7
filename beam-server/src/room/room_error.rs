use beam_core::RoomCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("room {0} already has a viewer")]
    RoomFull(RoomCode),
}
