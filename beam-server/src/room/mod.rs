mod room_directory;
mod room_error;

pub use room_directory::*;
pub use room_error::*;
