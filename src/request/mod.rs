//! The `request` module defines the wire protocol spoken with the broker.
//!
//! Every exchange is a single HTTP/1.0-style request on a fresh TCP
//! connection, answered by a status line, headers and an optional body whose
//! size is declared with `Content-Length`.

pub mod envelope;
pub mod request;
pub mod response;

pub use envelope::Envelope;
pub use request::{Method, Request};
pub use response::{Response, parse_response};
