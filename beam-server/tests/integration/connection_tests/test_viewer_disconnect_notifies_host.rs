use beam_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{TestClient, pair, start_relay};

#[tokio::test]
async fn test_viewer_disconnect_notifies_host() {
    init_tracing();
    let addr = start_relay().await.expect("Relay failed to start");

    let mut host = TestClient::connect(addr).await.expect("Host connect failed");
    let mut viewer = TestClient::connect(addr).await.expect("Viewer connect failed");
    let (room, _, viewer_id) = pair(&mut host, &mut viewer).await.expect("Pairing failed");

    viewer.close().await.expect("Failed to close viewer");

    assert_eq!(
        host.recv().await.unwrap(),
        ServerMessage::ViewerLeft { viewer: viewer_id }
    );

    // The freed slot can be taken again.
    let mut next = TestClient::connect(addr).await.expect("Next connect failed");
    next.send(&ClientMessage::JoinRoom { room }).await.unwrap();
    assert!(matches!(
        next.recv().await.unwrap(),
        ServerMessage::JoinedRoom { .. }
    ));
}
