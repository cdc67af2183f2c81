//! Error type shared by the poller, the relay and the listener

use thiserror::Error;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Errors that only mean "try again next cycle"
    pub fn is_transient(&self) -> bool {
        !matches!(self, RelayError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_not_transient() {
        assert!(!RelayError::Config("bad".to_string()).is_transient());
        assert!(RelayError::Timeout.is_transient());
        assert!(RelayError::Status(500).is_transient());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(RelayError::Status(503).to_string(), "Unexpected HTTP status 503");
        assert_eq!(RelayError::ConnectionClosed.to_string(), "Connection closed");
    }
}
