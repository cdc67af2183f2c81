//! Where a detected change gets published

use std::future::Future;
use std::sync::Arc;

use crate::api::websocket::notifier::ChangeNotifier;
use crate::error::RelayResult;
use crate::types::NotificationMessage;

/// Sink for reload notifications produced by the poller
pub trait ReloadPublisher: Send + Sync {
    /// Publish `message`, returning how many receivers it was handed to
    fn publish(&self, message: &NotificationMessage)
        -> impl Future<Output = RelayResult<usize>> + Send;
}

impl ReloadPublisher for ChangeNotifier {
    async fn publish(&self, message: &NotificationMessage) -> RelayResult<usize> {
        Ok(self.broadcast(message).delivered)
    }
}

impl<T: ReloadPublisher> ReloadPublisher for Arc<T> {
    fn publish(&self, message: &NotificationMessage)
        -> impl Future<Output = RelayResult<usize>> + Send {
        (**self).publish(message)
    }
}
