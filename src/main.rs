//! Results Relay - Binary Entry Point
//!
//! Serves the `/ws` push channel and runs the vote-count poller.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use results_relay::api::websocket::{AppState, ChangeNotifier};
use results_relay::poller::{HttpJsonSource, PollerStats, SnapshotPoller, UpstreamRelay};
use results_relay::{create_router, RelayConfig, RelayResult};

#[tokio::main]
async fn main() -> RelayResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RelayConfig::load()?;

    let notifier = Arc::new(ChangeNotifier::new());
    let stats = Arc::new(PollerStats::new());

    let source = HttpJsonSource::new(config.poll_url.clone(), config.poll_timeout)?;
    info!("Watching {}", source.url());
    let poller = SnapshotPoller::with_stats(source, Arc::clone(&stats));

    let poll_handle = match &config.upstream_relay_url {
        Some(url) => {
            let upstream = UpstreamRelay::new(url.clone()).with_timeout(config.poll_timeout);
            info!("Publishing changes to upstream relay {}", upstream.url());
            poller.start(upstream, config.poll_interval)
        }
        None => poller.start(Arc::clone(&notifier), config.poll_interval),
    };

    let state = AppState::new(Arc::clone(&notifier), stats)
        .with_allowed_origin(config.allowed_origin.clone());
    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("HTTP and WebSocket server is running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&notifier)))
        .await?;

    // Server first, then let any in-flight poll drain
    poll_handle.stop().await;
    info!("Shut down");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal(notifier: Arc<ChangeNotifier>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, closing client connections");
    notifier.close_all();
}
