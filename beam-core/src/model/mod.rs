mod connection;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use room::{Role, RoomCode};
pub use signaling::{ClientMessage, IceServerConfig, ServerMessage};
