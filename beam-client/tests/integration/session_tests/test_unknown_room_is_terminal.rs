use beam_client::{NegotiationState, SessionCommand, SessionError};
use beam_core::{Role, RoomCode};

use crate::integration::init_tracing;
use crate::utils::{MockFactory, TestSession, start_relay, wait_until};

#[tokio::test]
async fn test_unknown_room_is_terminal() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");

    let viewer = TestSession::spawn(addr, Role::Viewer, MockFactory::connecting(), None)
        .await
        .expect("Viewer failed to start");
    viewer
        .send(SessionCommand::Join(RoomCode::from("ZZZZZZ")))
        .await
        .unwrap();

    let notes = viewer.notes.clone();
    wait_until(move || notes.failures().contains(&SessionError::RoomNotFound))
        .await
        .expect("No room-not-found surfaced");

    assert_eq!(*viewer.state.borrow(), NegotiationState::Idle);
    assert_eq!(viewer.factory.opened(), 0);
    assert_eq!(viewer.notes.failures().len(), 1);
}
