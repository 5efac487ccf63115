use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::utils::{MqError, Result};

/// The three methods the broker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MqError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(MqError::MalformedResponse(format!("unknown method {other:?}"))),
        }
    }
}

/// One protocol exchange: a method, a resource path and an optional body.
///
/// A `Request` is also the unit stored in the engine's queues. Inbound
/// messages are wrapped in the poll request whose response carried them.
///
/// On the wire a request is written as
///
/// ```text
/// <METHOD> <RESOURCE> HTTP/1.0\r\n
/// Content-Length: <len>\r\n      (only with a body)
/// \r\n
/// <body>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    resource: String,
    body: Option<String>,
}

impl Request {
    /// Builds a request, rejecting resources that would corrupt the request line.
    pub fn new(method: Method, resource: impl Into<String>, body: Option<String>) -> Result<Self> {
        let resource = resource.into();
        if !resource.starts_with('/')
            || resource
                .chars()
                .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(MqError::InvalidResource(resource));
        }
        Ok(Self {
            method,
            resource,
            body,
        })
    }

    /// `PUT /topic/<topic>` carrying `"<sender> <topic> <message>"`.
    pub fn publish(sender: &str, topic: &str, message: &str) -> Result<Self> {
        Self::new(
            Method::Put,
            format!("/topic/{topic}"),
            Some(format!("{sender} {topic} {message}")),
        )
    }

    /// `PUT /subscription/<name>/<topic>`.
    pub fn subscribe(name: &str, topic: &str) -> Result<Self> {
        Self::new(Method::Put, format!("/subscription/{name}/{topic}"), None)
    }

    /// `DELETE /subscription/<name>/<topic>`.
    pub fn unsubscribe(name: &str, topic: &str) -> Result<Self> {
        Self::new(Method::Delete, format!("/subscription/{name}/{topic}"), None)
    }

    /// `GET /queue/<name>`, the mailbox poll.
    pub fn poll(name: &str) -> Result<Self> {
        Self::new(Method::Get, format!("/queue/{name}"), None)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Fills in the body once a response for this request has been parsed.
    pub fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }

    pub fn into_body(self) -> Option<String> {
        self.body
    }

    /// Serializes the request onto `w`. Nothing follows the body.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())?;
        w.flush()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = format!("{} {} HTTP/1.0\r\n", self.method, self.resource).into_bytes();
        match &self.body {
            Some(body) => {
                buf.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
                buf.extend_from_slice(body.as_bytes());
            }
            None => buf.extend_from_slice(b"\r\n"),
        }
        buf
    }
}
