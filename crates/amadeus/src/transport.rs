//! HTTP transport abstraction
//!
//! The client core never touches sockets. It hands a compiled [`Request`] to a
//! `Transport` and consumes the streamed reply: a status, headers, and a
//! stream of body chunks. The stream ending is the "end" event; a chunk error
//! is the "close"/"error" event.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::request::{Request, Verb};

/// Stream of raw body chunks
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Transport failures. These always surface to callers as network errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send request: {0}")]
    Send(String),
    #[error("Connection closed before the response ended: {0}")]
    Interrupted(String),
}

/// Streamed reply from the transport
pub struct TransportResponse {
    pub status: u16,
    /// Header names lowercased
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl TransportResponse {
    /// Builds a reply whose body arrives as the given chunks
    pub fn from_chunks(status: u16, headers: Vec<(String, String)>, chunks: Vec<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: stream::iter(chunks.into_iter().map(Ok)).boxed(),
        }
    }
}

/// Trait for executing HTTP requests
///
/// This abstraction allows easy mocking of HTTP calls in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError>;
}

/// Production transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a new reqwest-based transport
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Wraps an existing reqwest client, e.g. one configured with timeouts
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        let options = request.options();
        let url = format!(
            "{}//{}:{}{}",
            options.protocol, options.host, options.port, options.path
        );
        let method = match options.method {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.inner.request(method, &url);
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body().to_bytes() {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Interrupted(e.to_string())))
            .boxed();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
