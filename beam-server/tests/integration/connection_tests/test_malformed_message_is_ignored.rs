use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, create_room, start_relay};

#[tokio::test]
async fn test_malformed_message_is_ignored() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");
    let mut client = TestClient::connect(addr).await.expect("Connect failed");

    client.send_raw("not json").await.unwrap();
    client
        .send_raw(r#"{"type":"shout","payload":"hello"}"#)
        .await
        .unwrap();

    // Connection is still usable afterwards.
    let room = create_room(&mut client).await.expect("Room creation failed");
    assert!(!room.as_str().is_empty());
    assert!(client.is_silent_for(SILENCE_MS).await);
}
