//! Shared application state for the relay endpoints

use std::sync::Arc;

use super::notifier::ChangeNotifier;
use crate::poller::PollerStats;

/// State handed to every axum handler
pub struct AppState {
    /// Connection registry and broadcaster
    pub notifier: Arc<ChangeNotifier>,

    /// Statistics written by the poll loop
    pub poll_stats: Arc<PollerStats>,

    /// CORS origin; `None` allows any origin
    pub allowed_origin: Option<String>,
}

impl AppState {
    pub fn new(notifier: Arc<ChangeNotifier>, poll_stats: Arc<PollerStats>) -> Self {
        Self {
            notifier,
            poll_stats,
            allowed_origin: None,
        }
    }

    pub fn with_allowed_origin(mut self, origin: Option<String>) -> Self {
        self.allowed_origin = origin;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(ChangeNotifier::new()), Arc::new(PollerStats::new()))
    }
}
