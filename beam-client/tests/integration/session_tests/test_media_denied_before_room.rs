use beam_client::{NegotiationState, SessionCommand, SessionError};
use beam_core::Role;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{DeniedMedia, MockFactory, TestSession, start_relay, wait_until};

#[tokio::test]
async fn test_media_denied_before_room() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");

    let host = TestSession::spawn(
        addr,
        Role::Host,
        MockFactory::connecting(),
        Some(Arc::new(DeniedMedia)),
    )
    .await
    .expect("Host failed to start");
    host.send(SessionCommand::Start).await.unwrap();

    let notes = host.notes.clone();
    wait_until(move || !notes.failures().is_empty())
        .await
        .expect("No failure surfaced");

    assert_eq!(
        host.notes.failures(),
        vec![SessionError::MediaAcquisitionDenied]
    );
    assert_eq!(*host.state.borrow(), NegotiationState::Idle);
    assert!(host.notes.room().is_none());
    assert_eq!(host.factory.opened(), 0);
}
