//! Error taxonomy for failed API calls
//!
//! Every failure carries the full [`Response`] it was derived from, including
//! the originating request, so callers can inspect status, headers and body.

use std::fmt;

use serde_json::Value;

use crate::response::Response;

/// Kind of failure, derived from the status code and parse outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No HTTP response, or the connection broke mid-response
    Network,
    /// The body could not be decoded as JSON
    Parser,
    /// 4xx other than 401 and 404
    Client,
    /// 5xx
    Server,
    /// 401
    Authentication,
    /// 404
    NotFound,
    Unknown,
}

impl ErrorKind {
    /// Classifies a failed response. Precedence matters: status checks come
    /// before the parse outcome, so a 404 with an HTML body is `NotFound`.
    pub fn classify(status_code: Option<u16>, parsed: bool) -> Self {
        match status_code {
            None => ErrorKind::Network,
            Some(status) if status >= 500 => ErrorKind::Server,
            Some(401) => ErrorKind::Authentication,
            Some(404) => ErrorKind::NotFound,
            Some(status) if status >= 400 => ErrorKind::Client,
            Some(_) if !parsed => ErrorKind::Parser,
            Some(_) => ErrorKind::Unknown,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::Parser => "ParserError",
            ErrorKind::Client => "ClientError",
            ErrorKind::Server => "ServerError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Unknown => "UnknownError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failed API call
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ResponseError {
    kind: ErrorKind,
    message: String,
    response: Box<Response>,
}

impl ResponseError {
    pub fn new(kind: ErrorKind, response: Response) -> Self {
        let status = response
            .status_code()
            .map_or_else(|| "no status".to_string(), |status| status.to_string());
        let message = match describe(&response) {
            Some(description) => format!("[{status}] {description}"),
            None => format!("[{status}]"),
        };

        Self {
            kind,
            message,
            response: Box::new(response),
        }
    }

    /// Classifies and wraps a response that did not count as a success
    pub fn from_response(response: Response) -> Self {
        let kind = ErrorKind::classify(response.status_code(), response.is_parsed());
        Self::new(kind, response)
    }

    pub fn network(response: Response) -> Self {
        Self::new(ErrorKind::Network, response)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error name, e.g. `NotFoundError`
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// The API's `errors` array when present, otherwise the whole parsed
    /// result. `None` when the body was never parsed.
    pub fn description(&self) -> Option<&Value> {
        describe(&self.response)
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        *self.response
    }
}

fn describe(response: &Response) -> Option<&Value> {
    if !response.is_parsed() {
        return None;
    }
    let result = response.result()?;
    Some(result.get("errors").unwrap_or(result))
}
