//! API client composing configuration, token handling and the request
//! pipeline

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{
    warn_on_unrecognized_options, ClientConfig, ConfigError, Environment, Options, ProcessEnv,
};
use crate::error::ResponseError;
use crate::listener;
use crate::logger::{Logger, TracingLogger};
use crate::request::{language_version, Request, RequestParams, Verb, CLIENT_VERSION};
use crate::response::Response;
use crate::token::{TokenFetcher, TokenManager, TOKEN_PATH};
use crate::transport::{ReqwestTransport, Transport};

/// Stateless part of the client: builds, sends and classifies requests
struct Pipeline {
    config: ClientConfig,
    logger: Arc<dyn Logger>,
    http: Arc<dyn Transport>,
}

impl Pipeline {
    async fn execute(
        &self,
        verb: Verb,
        path: &str,
        params: Value,
        bearer_token: Option<String>,
    ) -> Result<Response, ResponseError> {
        let request = Request::new(RequestParams {
            host: self.config.host.clone(),
            port: self.config.port,
            ssl: self.config.ssl,
            verb,
            path: path.to_string(),
            params,
            bearer_token,
            client_version: CLIENT_VERSION.to_string(),
            language_version: language_version().to_string(),
            app_id: self.config.custom_app_id.clone(),
            app_version: self.config.custom_app_version.clone(),
        });
        self.log(&request);

        let outcome = self.http.send(&request).await;
        listener::handle(request, outcome, &self.config, self.logger.as_ref()).await
    }

    fn log(&self, request: &Request) {
        if self.config.debug() {
            self.logger.log(&format!("{request:#?}"));
        }
    }
}

#[async_trait]
impl TokenFetcher for Pipeline {
    async fn fetch_token(&self) -> Result<Response, ResponseError> {
        let params = json!({
            "grant_type": "client_credentials",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
        });
        self.execute(Verb::Post, TOKEN_PATH, params, None).await
    }
}

/// Client for the Amadeus REST API
///
/// Cheap to clone; clones share the cached access token.
#[derive(Clone)]
pub struct Client {
    pipeline: Arc<Pipeline>,
    access_token: Arc<TokenManager>,
}

impl Client {
    /// Builds a client, reading unset options from `AMADEUS_*` variables
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        Self::with_env(options, &ProcessEnv)
    }

    /// Builds a client with an explicit environment source
    pub fn with_env(options: Options, env: &dyn Environment) -> Result<Self, ConfigError> {
        let config = ClientConfig::resolve(&options, env)?;
        let logger: Arc<dyn Logger> = match options.supplied_logger() {
            Some(logger) => logger,
            None => Arc::new(TracingLogger),
        };
        let http: Arc<dyn Transport> = match options.supplied_http() {
            Some(http) => http,
            None => Arc::new(ReqwestTransport::new()),
        };

        warn_on_unrecognized_options(&options, &config, logger.as_ref());

        let pipeline = Arc::new(Pipeline {
            config,
            logger,
            http,
        });
        let access_token = Arc::new(TokenManager::new(pipeline.clone()));

        Ok(Self {
            pipeline,
            access_token,
        })
    }

    #[cfg(test)]
    fn with_clock(
        options: Options,
        env: &dyn Environment,
        clock: Arc<dyn crate::time::Clock>,
    ) -> Result<Self, ConfigError> {
        let client = Self::with_env(options, env)?;
        let access_token = Arc::new(TokenManager::with_clock(client.pipeline.clone(), clock));
        Ok(Self {
            pipeline: client.pipeline,
            access_token,
        })
    }

    /// Authenticated GET; `params` become the query string
    pub async fn get(&self, path: &str, params: Value) -> Result<Response, ResponseError> {
        self.request(Verb::Get, path, params).await
    }

    /// Authenticated POST; `params` become the JSON body. A JSON string is
    /// sent as-is.
    pub async fn post(&self, path: &str, params: Value) -> Result<Response, ResponseError> {
        self.request(Verb::Post, path, params).await
    }

    /// Authenticated DELETE; `params` become the query string
    pub async fn delete(&self, path: &str, params: Value) -> Result<Response, ResponseError> {
        self.request(Verb::Delete, path, params).await
    }

    /// Sends an authenticated request, fetching a token first if needed
    pub async fn request(
        &self,
        verb: Verb,
        path: &str,
        params: Value,
    ) -> Result<Response, ResponseError> {
        let bearer_token = self.access_token.bearer_token().await?;
        self.pipeline
            .execute(verb, path, params, Some(bearer_token))
            .await
    }

    /// Sends a request without an `Authorization` header
    pub async fn unauthenticated_request(
        &self,
        verb: Verb,
        path: &str,
        params: Value,
    ) -> Result<Response, ResponseError> {
        self.pipeline.execute(verb, path, params, None).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.pipeline.config
    }

    pub fn access_token(&self) -> &TokenManager {
        &self.access_token
    }

    /// True when the log level is debug
    pub fn debug(&self) -> bool {
        self.pipeline.config.debug()
    }

    /// True when the log level is warn or debug
    pub fn warn(&self) -> bool {
        self.pipeline.config.warn()
    }

    /// Logs a request through the configured logger when debugging
    pub fn log(&self, request: &Request) {
        self.pipeline.log(request);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.pipeline.config)
            .finish_non_exhaustive()
    }
}
