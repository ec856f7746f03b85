//! Client library for the Amadeus travel REST APIs
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use amadeus::{Amadeus, Options};
//! use serde_json::json;
//!
//! let amadeus = Amadeus::new(Options::new().client_id("id").client_secret("secret"))?;
//! let response = amadeus
//!     .client()
//!     .get("/v1/reference-data/locations", json!({ "keyword": "LON", "subType": "AIRPORT" }))
//!     .await?;
//! println!("{:?}", response.data());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
mod listener;
pub mod logger;
pub mod request;
pub mod response;
pub mod time;
pub mod token;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ConfigError, Environment, Hostname, LogLevel, Options, ProcessEnv};
pub use error::{ErrorKind, ResponseError};
pub use logger::{Logger, TracingLogger};
pub use request::{Request, Verb};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};

/// Entry point holding the shared [`Client`]
#[derive(Debug, Clone)]
pub struct Amadeus {
    client: Client,
}

impl Amadeus {
    /// Resolves configuration and builds the client. Fails immediately when
    /// credentials are missing from both `options` and the environment.
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        Self::with_env(options, &ProcessEnv)
    }

    /// Like [`Amadeus::new`] with an explicit environment source
    pub fn with_env(options: Options, env: &dyn Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::with_env(options, env)?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
