//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::registry::ChannelConnection;
use super::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (connection, mut outbound) = ChannelConnection::pair();
    let id = state.notifier.register(Arc::new(connection));

    // Writer: drain the connection channel into the socket. The channel
    // closes when the registry drops the connection (shutdown).
    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text.to_string())).await.is_err() {
                return; // Client went away
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        state.notifier.relay_inbound(id, &text);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(connection = %id, "Dropping binary client message");
                    }
                    // Pings are answered by the protocol layer
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(connection = %id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            _ = &mut writer => break,
        }
    }

    state.notifier.unregister(id);
    writer.abort();
}
