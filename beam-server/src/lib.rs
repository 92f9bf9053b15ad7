mod config;
mod connection;
mod relay;
mod room;
mod signaling;

pub use config::*;
pub use connection::*;
pub use relay::*;
pub use room::*;
pub use signaling::*;
