//! Response envelope returned for every API call
//!
//! Body bytes are appended as they arrive from the transport. A single
//! [`Response::parse`] call then decides whether the body is JSON and
//! extracts `result`/`data`; after that the envelope is read-only.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::request::Request;

/// Content types that are decoded as JSON, matched exactly
pub const JSON_CONTENT_TYPES: [&str; 2] = ["application/json", "application/vnd.amadeus+json"];

#[derive(Clone)]
pub struct Response {
    status_code: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    result: Option<Value>,
    data: Option<Value>,
    parsed: bool,
    complete: bool,
    request: Request,
}

impl Response {
    /// Creates an empty envelope. `status_code` is `None` when no HTTP
    /// response was received at all.
    pub fn new(status_code: Option<u16>, headers: Vec<(String, String)>, request: Request) -> Self {
        Self {
            status_code,
            headers,
            body: Vec::new(),
            result: None,
            data: None,
            parsed: false,
            complete: false,
            request,
        }
    }

    /// Appends a chunk of the raw body. Ignored once parsed.
    pub fn add_chunk(&mut self, chunk: &[u8]) {
        if self.complete {
            tracing::debug!("ignoring {} body bytes received after parse", chunk.len());
            return;
        }
        self.body.extend_from_slice(chunk);
    }

    /// Tries to decode the raw body. Decode failures are not errors here;
    /// they leave `parsed` false and get classified by the caller.
    pub fn parse(&mut self) {
        if self.complete {
            return;
        }
        self.complete = true;

        if self.status_code == Some(204) {
            return;
        }

        if !self.is_json() {
            self.parsed = false;
            return;
        }

        match serde_json::from_slice::<Value>(&self.body) {
            Ok(result) => {
                self.data = result.get("data").cloned();
                self.result = Some(result);
                self.parsed = true;
            }
            Err(e) => {
                tracing::debug!("response body is not valid JSON: {e}");
                self.parsed = false;
            }
        }
    }

    /// Whether this call counts as a success: any 204, or a parsed body
    /// with a 2xx status.
    pub fn success(&self) -> bool {
        match self.status_code {
            Some(204) => true,
            Some(status) => self.parsed && (200..300).contains(&status),
            None => false,
        }
    }

    fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|content_type| JSON_CONTENT_TYPES.contains(&content_type))
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Raw body as text, with invalid UTF-8 replaced
    pub fn body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn request(&self) -> &Request {
        &self.request
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("body", &self.body())
            .field("result", &self.result)
            .field("parsed", &self.parsed)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
