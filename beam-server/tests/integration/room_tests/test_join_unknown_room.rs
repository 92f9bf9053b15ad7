use beam_core::{ClientMessage, RoomCode, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, create_room, start_relay};

#[tokio::test]
async fn test_join_unknown_room() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");

    let mut host = TestClient::connect(addr).await.expect("Host connect failed");
    let mut viewer = TestClient::connect(addr).await.expect("Viewer connect failed");
    let room = create_room(&mut host).await.expect("Room creation failed");

    // Codes are matched exactly.
    let wrong = RoomCode::from(room.as_str().to_ascii_lowercase());
    viewer
        .send(&ClientMessage::JoinRoom { room: wrong })
        .await
        .unwrap();

    assert_eq!(viewer.recv().await.unwrap(), ServerMessage::RoomNotFound);
    assert!(host.is_silent_for(SILENCE_MS).await);
}
