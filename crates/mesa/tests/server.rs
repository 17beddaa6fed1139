//! Integration tests for the server, handler, and full connection flow
//! over real WebSockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mesa::MesaServer;
use mesa_protocol::{ClientEvent, RoomId, ServerEvent};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = MesaServer::bind("127.0.0.1:0")
        .await
        .expect("server should bind");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_event(ws: &mut ClientWs, event: &ClientEvent) {
    let text = serde_json::to_string(event).expect("encode");
    ws.send(Message::Text(text.into())).await.expect("send");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream should not end here")
        .expect("recv");
    let text = msg.into_text().expect("text frame");
    serde_json::from_str(&text).expect("decode server event")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_receives_room_list() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    match recv_event(&mut ws).await {
        ServerEvent::RoomListUpdate { rooms } => assert!(rooms.is_empty()),
        other => panic!("expected room_list_update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lobby_flow_over_socket() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    recv_event(&mut ws).await; // initial room list

    // Create.
    send_event(
        &mut ws,
        &ClientEvent::CreateRoom {
            player_name: "Zeca".into(),
        },
    )
    .await;
    let room_id = match recv_event(&mut ws).await {
        ServerEvent::RoomCreated { room_id } => room_id,
        other => panic!("expected room_created, got {other:?}"),
    };
    assert_eq!(room_id, RoomId(1));
    match recv_event(&mut ws).await {
        ServerEvent::RoomListUpdate { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].count, 0);
        }
        other => panic!("expected room_list_update, got {other:?}"),
    }

    // Join.
    send_event(
        &mut ws,
        &ClientEvent::JoinRoom {
            room_id,
            player_name: "Zeca".into(),
            avatar_id: 3,
        },
    )
    .await;
    match recv_event(&mut ws).await {
        ServerEvent::RoomState {
            room_id: rid,
            room_name,
            seats,
            ..
        } => {
            assert_eq!(rid, room_id);
            assert_eq!(room_name, "Mesa 1");
            assert!(seats.iter().all(Option::is_none));
        }
        other => panic!("expected room_state, got {other:?}"),
    }

    // Sit.
    send_event(&mut ws, &ClientEvent::SitDown { room_id, slot: 2 }).await;
    match recv_event(&mut ws).await {
        ServerEvent::UpdatePlayers { seats } => {
            let seat = seats[2].as_ref().expect("seat 2 taken");
            assert_eq!(seat.name, "Zeca");
            assert_eq!(seat.avatar_id, 3);
        }
        other => panic!("expected update_players, got {other:?}"),
    }
    match recv_event(&mut ws).await {
        ServerEvent::RoomListUpdate { rooms } => {
            assert_eq!(rooms[0].count, 1);
        }
        other => panic!("expected room_list_update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_frame_is_skipped() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    recv_event(&mut ws).await;

    // Send garbage, then a valid event. The garbage must not kill the
    // connection.
    ws.send(Message::Text("not json".into())).await.expect("send");
    send_event(
        &mut ws,
        &ClientEvent::CreateRoom {
            player_name: "p".into(),
        },
    )
    .await;

    assert!(matches!(
        recv_event(&mut ws).await,
        ServerEvent::RoomCreated { .. }
    ));
}

#[tokio::test]
async fn test_socket_close_destroys_room() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    recv_event(&mut ws1).await;
    send_event(
        &mut ws1,
        &ClientEvent::CreateRoom {
            player_name: "p".into(),
        },
    )
    .await;
    let room_id = match recv_event(&mut ws1).await {
        ServerEvent::RoomCreated { room_id } => room_id,
        other => panic!("expected room_created, got {other:?}"),
    };
    recv_event(&mut ws1).await; // list update
    send_event(
        &mut ws1,
        &ClientEvent::JoinRoom {
            room_id,
            player_name: "p".into(),
            avatar_id: 0,
        },
    )
    .await;
    recv_event(&mut ws1).await; // room state

    // A second connection sees the room in its initial list.
    let mut ws2 = connect(&addr).await;
    match recv_event(&mut ws2).await {
        ServerEvent::RoomListUpdate { rooms } => assert_eq!(rooms.len(), 1),
        other => panic!("expected room_list_update, got {other:?}"),
    }

    // Closing the only member's socket empties and destroys the room.
    ws1.send(Message::Close(None)).await.expect("close");
    match recv_event(&mut ws2).await {
        ServerEvent::RoomListUpdate { rooms } => assert!(rooms.is_empty()),
        other => panic!("expected empty room_list_update, got {other:?}"),
    }
}
