use beam_core::ClientMessage;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, pair, start_relay};

#[tokio::test]
async fn test_message_to_unpaired_target_is_dropped() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");

    let mut host = TestClient::connect(addr).await.expect("Host connect failed");
    let mut viewer = TestClient::connect(addr).await.expect("Viewer connect failed");
    let (_, host_id, _) = pair(&mut host, &mut viewer).await.expect("Pairing failed");

    // A third party that learned the host id cannot inject negotiation messages.
    let mut intruder = TestClient::connect(addr).await.expect("Intruder connect failed");
    intruder
        .send(&ClientMessage::Offer {
            target: host_id,
            sdp: json!({ "type": "offer", "sdp": "v=0" }),
        })
        .await
        .unwrap();

    assert!(host.is_silent_for(SILENCE_MS).await);
    assert!(intruder.is_silent_for(SILENCE_MS).await);
}
