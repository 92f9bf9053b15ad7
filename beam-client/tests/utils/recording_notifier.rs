use beam_client::{NegotiationState, Notice, Notifier, SessionError};
use beam_core::RoomCode;
use std::sync::Mutex;

/// Keeps everything the session wanted to show.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    states: Mutex<Vec<NegotiationState>>,
    room: Mutex<Option<RoomCode>>,
    failures: Mutex<Vec<SessionError>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.text.clone())
            .collect()
    }

    pub fn states(&self) -> Vec<NegotiationState> {
        self.states.lock().unwrap().clone()
    }

    pub fn room(&self) -> Option<RoomCode> {
        self.room.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<SessionError> {
        self.failures.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn state_changed(&self, state: NegotiationState) {
        self.states.lock().unwrap().push(state);
    }

    fn room_ready(&self, room: &RoomCode) {
        *self.room.lock().unwrap() = Some(room.clone());
    }

    fn failed(&self, error: &SessionError) {
        self.failures.lock().unwrap().push(error.clone());
    }
}
