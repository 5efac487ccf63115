//! The `error` module defines the error type shared by every part of `mq-client`.
//!
//! Only construction and lifecycle failures reach the application. Failures
//! inside the pusher and puller loops are logged and retried or discarded
//! there, and never cross the thread boundary.

use std::io;

use thiserror::Error;

use crate::client::State;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MqError>;

#[derive(Debug, Error)]
pub enum MqError {
    /// The client name cannot be used in a resource path.
    #[error("invalid client name {0:?}")]
    InvalidName(String),

    /// The topic cannot be used in a resource path.
    #[error("invalid topic {0:?}")]
    InvalidTopic(String),

    /// A request resource must be an absolute path without whitespace.
    #[error("invalid resource {0:?}")]
    InvalidResource(String),

    /// The broker address could not be resolved.
    #[error("cannot resolve broker address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The readiness pipe could not be created or configured.
    #[error("readiness channel failure: {0}")]
    Signal(#[source] io::Error),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// A lifecycle operation was called in the wrong state.
    #[error("cannot {operation} an engine in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: State,
    },

    /// A worker thread panicked before it could be joined.
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),

    /// The broker sent something that is not a well-formed response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
