//! Data types for the results relay
//!
//! This module contains the messages exchanged with clients and the cached
//! poll snapshot.

mod notification;
mod snapshot;

pub use notification::{InboundMessage, NotificationMessage, DATA_RELOAD, RESULTS_TOPIC};
pub use snapshot::{VoteCountSnapshot, ROW_COUNT_FIELD};
