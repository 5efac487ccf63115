//! The `transport` module opens the TCP connections the engine uses.
//!
//! The broker protocol uses one connection per exchange, so this is only
//! address resolution and a connect with a timeout.

pub mod socket;

pub use socket::{connect, resolve};

#[cfg(test)]
mod tests;
