//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use results_relay::{create_router, AppState, ChangeNotifier};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const RELOAD_FRAME: &str = r#"{"message":"results","command":"data_reload"}"#;

/// Serve `app` on an ephemeral local port, returning its address
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

/// Start a relay and return its notifier and address
pub async fn start_relay() -> (Arc<ChangeNotifier>, String) {
    let state = Arc::new(AppState::default());
    let notifier = Arc::clone(&state.notifier);
    let addr = serve(create_router(state)).await;
    (notifier, addr)
}

pub async fn connect(addr: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

/// Wait until the notifier has exactly `n` registered connections
pub async fn wait_for_connections(notifier: &ChangeNotifier, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while notifier.connection_count() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} connections, have {}",
            n,
            notifier.connection_count()
        )
    });
}

/// Next text frame, failing the test after a timeout
pub async fn next_text(client: &mut Client) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {:?}", other),
            }
        }
    })
    .await;
    frame.expect("timed out waiting for a text frame")
}

/// Assert nothing arrives within `wait`
pub async fn assert_silent(client: &mut Client, wait: Duration) {
    if let Ok(frame) = tokio::time::timeout(wait, client.next()).await {
        panic!("unexpected frame: {:?}", frame);
    }
}
