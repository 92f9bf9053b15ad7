pub mod mock_transport;
pub mod recording_notifier;
pub mod session_helpers;

pub use mock_transport::*;
pub use recording_notifier::*;
pub use session_helpers::*;
pub use test_media::*;
