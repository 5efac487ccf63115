//! The `client` module is the broker client engine.
//!
//! It provides `MessageQueue`, which stages publish/subscribe requests for a
//! background pusher, collects mailbox deliveries from a background puller
//! and signals their arrival through a pollable `Readiness` handle.

pub mod backoff;
pub mod engine;
pub mod pubsub;
pub mod shutdown;
pub mod signal;
mod worker;

pub use backoff::Backoff;
pub use engine::{MessageQueue, SENTINEL, State};
pub use pubsub::PubSub;
pub use shutdown::ShutdownSignal;
pub use signal::{Notifier, Readiness};

#[cfg(test)]
mod tests;
