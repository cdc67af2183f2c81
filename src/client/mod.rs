//! Client side of the push channel

pub mod listener;

pub use listener::{ListenerState, ResultsListener};
