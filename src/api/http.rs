//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{extract::State, http::HeaderValue, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use super::websocket::{handler::ws_handler, state::AppState};
use crate::poller::PollStatus;

/// Response for GET /api/status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub connections: usize,
    pub broadcasts_sent: u64,
    pub poll: PollStatus,
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(state.allowed_origin.as_deref()))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        .route("/api/status", get(status))
        .layer(cors)
        .with_state(state)
}

fn allow_origin(origin: Option<&str>) -> AllowOrigin {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(_)) => {
            warn!("Ignoring invalid CORS origin {:?}, allowing any origin", origin);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/status - connection count and the poller's last outcome
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connections: state.notifier.connection_count(),
        broadcasts_sent: state.notifier.broadcasts_sent(),
        poll: state.poll_stats.status(),
    })
}
