use crate::utils::ROOM_CODE_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Short, human-typeable code shared out of band to pair two peers.
///
/// Codes are opaque: nothing beyond equality is ever derived from their content.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Random code built from the leading hex digits of a v4 UUID.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..ROOM_CODE_LEN].to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a room a connection plays.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Created the room and waits for a counter-party.
    Host,
    /// Joined an existing room with its code.
    Viewer,
}
