use beam_client::NegotiationState;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockFactory, TestMedia, connected_pair, start_relay};

#[tokio::test]
async fn test_media_end_closes_host() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");
    let media = Arc::new(TestMedia::default());

    let (mut host, mut viewer) = connected_pair(
        addr,
        MockFactory::connecting(),
        MockFactory::connecting(),
        media.clone(),
    )
    .await
    .expect("Pair did not connect");

    media.end_latest();

    host.reach(NegotiationState::Closed).await.unwrap();
    assert!(
        host.notes
            .texts()
            .iter()
            .any(|t| t == "Screen sharing ended")
    );
    assert!(media.latest_stopped());

    viewer.reach(NegotiationState::Idle).await.unwrap();
}
