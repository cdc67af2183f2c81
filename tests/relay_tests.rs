//! Integration tests for the WebSocket push channel

mod common;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use common::{assert_silent, connect, next_text, start_relay, wait_for_connections, RELOAD_FRAME};
use results_relay::NotificationMessage;

#[tokio::test]
async fn test_broadcast_reaches_all_clients() {
    let (notifier, addr) = start_relay().await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        clients.push(connect(&addr).await);
    }
    wait_for_connections(&notifier, 5).await;

    let report = notifier.broadcast(&NotificationMessage::data_reload());
    assert_eq!(report.delivered, 5);

    for client in &mut clients {
        assert_eq!(next_text(client).await, RELOAD_FRAME);
    }
}

#[tokio::test]
async fn test_broadcast_with_no_clients() {
    let (notifier, _addr) = start_relay().await;

    let report = notifier.broadcast(&NotificationMessage::data_reload());

    assert_eq!(report.attempted, 0);
    assert_eq!(notifier.broadcasts_sent(), 1);
}

#[tokio::test]
async fn test_closed_client_is_unregistered() {
    let (notifier, addr) = start_relay().await;

    let mut leaving = connect(&addr).await;
    let mut staying = connect(&addr).await;
    wait_for_connections(&notifier, 2).await;

    leaving.close(None).await.unwrap();
    wait_for_connections(&notifier, 1).await;

    notifier.broadcast(&NotificationMessage::data_reload());
    assert_eq!(next_text(&mut staying).await, RELOAD_FRAME);
}

#[tokio::test]
async fn test_client_json_is_relayed_to_others() {
    let (notifier, addr) = start_relay().await;

    let mut sender = connect(&addr).await;
    let mut first = connect(&addr).await;
    let mut second = connect(&addr).await;
    wait_for_connections(&notifier, 3).await;

    let frame = r#"{"message":"results","command":"data_reload","from":"admin"}"#;
    sender.send(Message::Text(frame.to_string())).await.unwrap();

    assert_eq!(next_text(&mut first).await, frame);
    assert_eq!(next_text(&mut second).await, frame);
    assert_silent(&mut sender, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_malformed_frame_keeps_sender_connected() {
    let (notifier, addr) = start_relay().await;

    let mut sender = connect(&addr).await;
    let mut other = connect(&addr).await;
    wait_for_connections(&notifier, 2).await;

    sender
        .send(Message::Text("definitely { not json".to_string()))
        .await
        .unwrap();

    assert_silent(&mut other, Duration::from_millis(200)).await;
    assert_eq!(notifier.connection_count(), 2);

    // The sender still gets later broadcasts
    notifier.broadcast(&NotificationMessage::data_reload());
    assert_eq!(next_text(&mut sender).await, RELOAD_FRAME);
    assert_eq!(next_text(&mut other).await, RELOAD_FRAME);
}

#[tokio::test]
async fn test_close_all_disconnects_clients() {
    let (notifier, addr) = start_relay().await;

    let mut client = connect(&addr).await;
    wait_for_connections(&notifier, 1).await;

    assert_eq!(notifier.close_all(), 1);
    assert_eq!(notifier.connection_count(), 0);

    // The client sees the socket close rather than hanging
    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("client was not disconnected");
    assert!(
        matches!(frame, None | Some(Ok(Message::Close(_)))),
        "unexpected frame: {:?}",
        frame
    );
}
