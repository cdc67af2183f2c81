//! results-watch - follow reload notifications from the command line
//!
//! Connects to a relay, and every time it announces a change, re-fetches
//! the results payload and logs a short summary of it.

use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use results_relay::{HttpJsonSource, RelayResult, ResultsListener, WatchConfig};

#[tokio::main]
async fn main() -> RelayResult<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = WatchConfig::load()?;
    let results = HttpJsonSource::new(config.results_url.clone(), config.request_timeout)?;
    let listener = ResultsListener::new(config.ws_url.clone(), results)
        .with_reconnect_delay(config.reconnect_delay);

    tokio::select! {
        result = listener.run(log_results) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}

fn log_results(results: Value) {
    match &results {
        Value::Array(rows) => info!("Results reloaded: {} contributor(s)", rows.len()),
        other => info!("Results reloaded: {}", other),
    }
}
