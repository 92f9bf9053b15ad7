pub use beam_core::model::{ConnectionId, Role, RoomCode};

pub mod model {
    pub use beam_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use beam_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use beam_client::*;
}
