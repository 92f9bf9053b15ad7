use beam_client::{NegotiationState, SessionCommand, SessionError, TransportState};
use beam_core::Role;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockFactory, TestMedia, TestSession, fast_config, start_relay, wait_until};

#[tokio::test]
async fn test_retry_exhaustion() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");
    let max = fast_config().retry.max_attempts;

    let host = TestSession::spawn(
        addr,
        Role::Host,
        MockFactory::manual(),
        Some(Arc::new(TestMedia::default())),
    )
    .await
    .expect("Host failed to start");
    host.send(SessionCommand::Start).await.unwrap();
    let room = host.room().await.unwrap();

    let mut viewer = TestSession::spawn(addr, Role::Viewer, MockFactory::manual(), None)
        .await
        .expect("Viewer failed to start");
    viewer.send(SessionCommand::Join(room)).await.unwrap();

    // Every transport the viewer opens fails right away.
    for opened in 1..=(max as usize + 1) {
        let factory = viewer.factory.clone();
        wait_until(move || factory.opened() == opened)
            .await
            .unwrap_or_else(|_| panic!("Transport {opened} was never opened"));
        viewer.factory.report_latest(TransportState::Failed);
    }

    viewer
        .reach(NegotiationState::Failed)
        .await
        .expect("Viewer never gave up");

    assert_eq!(viewer.factory.opened(), max as usize + 1);
    assert_eq!(viewer.factory.closed(), max as usize + 1);
    assert_eq!(
        viewer.notes.failures(),
        vec![SessionError::MaxRetriesExceeded { attempts: max }]
    );
    assert_eq!(
        viewer
            .notes
            .states()
            .iter()
            .filter(|s| **s == NegotiationState::Reconnecting)
            .count(),
        max as usize
    );
}
