//! # mq-client
//!
//! `mq-client` is a client engine for a small HTTP/1.0 publish/subscribe broker.
//! Requests are staged on an outgoing queue and sent by a background pusher;
//! a background puller long-polls the client's mailbox and hands deliveries to
//! the application through an incoming queue and a pollable readiness pipe.
//!
//! ## Core Modules
//!
//! - `queue`: The blocking, closable FIFO shared between the workers and the application.
//! - `request`: The wire request, response parsing and the chat message envelope.
//! - `client`: The `MessageQueue` engine with its pusher and puller threads.
//! - `transport`: Broker address resolution and connection setup.
//! - `config`: Loads client, engine and log settings from file and environment.
//! - `chat`: A line-oriented chat session on top of the engine.
//! - `utils`: Error type and logging setup.

pub mod chat;
pub mod client;
pub mod config;
pub mod queue;
pub mod request;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
