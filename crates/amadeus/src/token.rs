//! OAuth2 client-credentials token cache
//!
//! Keeps the current bearer token and its expiry. When the token is missing
//! or about to expire, exactly one fetch runs; every caller that arrives while
//! it is in flight awaits the same shared future and gets the same outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::error::{ErrorKind, ResponseError};
use crate::response::Response;
use crate::time::{Clock, SystemClock};

/// Token endpoint for the client-credentials grant
pub const TOKEN_PATH: &str = "/v1/security/oauth2/token";

/// Seconds before expiry at which a token is already treated as stale
pub const TOKEN_BUFFER_SECONDS: i64 = 10;

/// A cached bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Reads `access_token` and `expires_in` (seconds) from a token response
    pub fn from_response(response: &Response, now: DateTime<Utc>) -> Result<Self, ResponseError> {
        let result = response.result();
        let value = result
            .and_then(|result| result.get("access_token"))
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty());
        let expires_in = result
            .and_then(|result| result.get("expires_in"))
            .and_then(serde_json::Value::as_f64);

        match (value, expires_in.and_then(|secs| expiry(now, secs))) {
            (Some(value), Some(expires_at)) => Ok(Self::new(value, expires_at)),
            _ => Err(ResponseError::new(ErrorKind::Parser, response.clone())),
        }
    }

    /// True once `now` is within the buffer of the expiry time
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(TOKEN_BUFFER_SECONDS) < now
    }
}

/// `now + expires_in`, or `None` when `expires_in` is negative, not finite or
/// past the representable range
fn expiry(now: DateTime<Utc>, expires_in: f64) -> Option<DateTime<Utc>> {
    if !expires_in.is_finite() || expires_in < 0.0 {
        return None;
    }
    let lifetime = Duration::try_milliseconds((expires_in * 1000.0) as i64)?;
    now.checked_add_signed(lifetime)
}

/// Performs the unauthenticated token request
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<Response, ResponseError>;
}

type PendingToken = Shared<BoxFuture<'static, Result<String, ResponseError>>>;

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    pending: Option<PendingToken>,
}

/// Owner of the cached token and the in-flight refresh
pub struct TokenManager {
    fetcher: Arc<dyn TokenFetcher>,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<TokenState>>,
}

impl TokenManager {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self::with_clock(fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn TokenFetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            clock,
            state: Arc::new(Mutex::new(TokenState::default())),
        }
    }

    /// Returns a valid bearer token, fetching one if needed
    ///
    /// Concurrent callers share a single fetch. A failed fetch is returned to
    /// every waiter and leaves the cache empty, so the next call tries again.
    pub async fn bearer_token(&self) -> Result<String, ResponseError> {
        let pending = {
            let mut state = self.state.lock().await;

            if let Some(token) = &state.token {
                if !token.is_stale(self.clock.now()) {
                    return Ok(token.value.clone());
                }
            }

            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    let pending = self.refresh();
                    state.pending = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Whether the next `bearer_token` call would trigger a fetch
    pub async fn needs_refresh(&self) -> bool {
        let state = self.state.lock().await;
        state
            .token
            .as_ref()
            .map_or(true, |token| token.is_stale(self.clock.now()))
    }

    /// Currently cached token, stale or not
    pub async fn cached(&self) -> Option<AccessToken> {
        self.state.lock().await.token.clone()
    }

    fn refresh(&self) -> PendingToken {
        let fetcher = Arc::clone(&self.fetcher);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);

        async move {
            tracing::debug!("fetching access token");
            let outcome = match fetcher.fetch_token().await {
                Ok(response) => AccessToken::from_response(&response, clock.now()),
                Err(e) => Err(e),
            };

            let mut state = state.lock().await;
            state.pending = None;
            match outcome {
                Ok(token) => {
                    tracing::debug!(expires_at = %token.expires_at, "access token refreshed");
                    let value = token.value.clone();
                    state.token = Some(token);
                    Ok(value)
                }
                Err(e) => {
                    tracing::debug!("access token fetch failed: {e}");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}
