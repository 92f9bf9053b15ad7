mod config;
mod error;
mod machine;
mod media;
mod notifier;
mod session;
mod signaling;
mod supervisor;
mod transport;

pub use config::*;
pub use error::*;
pub use machine::*;
pub use media::*;
pub use notifier::*;
pub use session::*;
pub use signaling::*;
pub use supervisor::*;
pub use transport::*;
