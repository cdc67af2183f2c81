//! Vote-count poller
//!
//! Samples the vote store's summary endpoint on a fixed interval and
//! publishes a reload notification whenever the sample changes.
//!
//! ## Pieces
//! - [`SnapshotSource`]: where samples come from (`HttpJsonSource` in production)
//! - [`SnapshotPoller`]: compare-and-publish cycle, plus the timer loop
//! - [`ReloadPublisher`]: in-process [`ChangeNotifier`](crate::api::websocket::notifier::ChangeNotifier)
//!   or an [`UpstreamRelay`]

pub mod publisher;
pub mod runner;
pub mod source;
pub mod stats;
pub mod upstream;

pub use publisher::ReloadPublisher;
pub use runner::{PollerHandle, SnapshotPoller, DEFAULT_POLL_INTERVAL};
pub use source::{HttpJsonSource, SnapshotSource};
pub use stats::{PollOutcome, PollStatus, PollerStats};
pub use upstream::UpstreamRelay;
