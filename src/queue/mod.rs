//! The `queue` module provides the blocking FIFO used to stage requests
//! between the application and the engine's worker threads.

pub mod queue;

pub use queue::Queue;

#[cfg(test)]
mod tests;
