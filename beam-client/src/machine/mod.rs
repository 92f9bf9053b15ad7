mod effect;
mod event;
mod negotiation;
mod state;

pub use effect::*;
pub use event::*;
pub use negotiation::*;
pub use state::*;
