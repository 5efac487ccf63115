use std::io::{BufRead, Read};

use crate::utils::{MqError, Result};

/// Marker the status line must contain for an exchange to count.
pub const STATUS_OK: &str = "200 OK";

/// A parsed broker response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_line: String,
    pub content_length: Option<usize>,
    pub body: Option<String>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status_line.contains(STATUS_OK)
    }

    /// The delivered message, if any. Empty bodies count as no message.
    pub fn into_message(self) -> Option<String> {
        if !self.is_ok() {
            return None;
        }
        self.body.filter(|b| !b.is_empty())
    }
}

/// Reads one response from `reader`.
///
/// Anything other than a `200 OK` status stops after the status line and
/// yields a response without a body. For a successful status the headers are
/// consumed up to the blank line and the body is read: exactly
/// `Content-Length` bytes when the header is present, otherwise up to EOF.
pub fn parse_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut status_line = String::new();
    if reader.read_line(&mut status_line)? == 0 {
        return Err(MqError::MalformedResponse("connection closed before status line".into()));
    }
    let status_line = status_line.trim_end().to_string();

    if !status_line.contains(STATUS_OK) {
        return Ok(Response {
            status_line,
            content_length: None,
            body: None,
        });
    }

    let mut content_length = None;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let len = value.trim().parse::<usize>().map_err(|_| {
                    MqError::MalformedResponse(format!("bad Content-Length {:?}", value.trim()))
                })?;
                content_length = Some(len);
            }
        }
    }

    let mut raw = Vec::new();
    match content_length {
        Some(len) => {
            // The declared length is untrusted; only what arrives is buffered.
            reader.by_ref().take(len as u64).read_to_end(&mut raw)?;
            if raw.len() != len {
                return Err(MqError::MalformedResponse(format!(
                    "body shorter than {len} bytes: got {}",
                    raw.len()
                )));
            }
        }
        None => {
            reader.read_to_end(&mut raw)?;
        }
    }

    Ok(Response {
        status_line,
        content_length,
        body: Some(String::from_utf8_lossy(&raw).into_owned()),
    })
}
