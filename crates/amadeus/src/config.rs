//! Client configuration
//!
//! Every setting resolves in the same order: explicitly supplied option,
//! then the `AMADEUS_<UPPER_SNAKE_KEY>` environment variable, then a default.
//! `clientId` and `clientSecret` have no default and fail construction when
//! absent.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::logger::Logger;
use crate::transport::Transport;

const ENV_PREFIX: &str = "AMADEUS";

/// Every option name the client understands
pub const RECOGNIZED_OPTIONS: [&str; 11] = [
    "clientId",
    "clientSecret",
    "logger",
    "logLevel",
    "hostname",
    "host",
    "customAppId",
    "customAppVersion",
    "http",
    "ssl",
    "port",
];

/// Hostname → API host
pub const HOSTS: [(Hostname, &str); 2] = [
    (Hostname::Test, "test.api.amadeus.com"),
    (Hostname::Production, "api.amadeus.com"),
];

/// Configuration errors, raised at construction time
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required argument: {0}")]
    MissingCredential(&'static str),
    #[error("Invalid value for option {key}: {value:?}")]
    InvalidOption { key: &'static str, value: String },
}

/// Verbosity of request/response diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    Warn,
    #[default]
    Silent,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Warn => "warn",
            LogLevel::Silent => "silent",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "warn" => Ok(LogLevel::Warn),
            "silent" => Ok(LogLevel::Silent),
            _ => Err(()),
        }
    }
}

/// Named API environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hostname {
    #[default]
    Test,
    Production,
}

impl Hostname {
    pub fn as_str(self) -> &'static str {
        match self {
            Hostname::Test => "test",
            Hostname::Production => "production",
        }
    }

    /// The API host this environment points at
    pub fn host(self) -> &'static str {
        HOSTS
            .iter()
            .find(|(hostname, _)| *hostname == self)
            .map_or(HOSTS[0].1, |(_, host)| *host)
    }
}

impl FromStr for Hostname {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Hostname::Test),
            "production" => Ok(Hostname::Production),
            _ => Err(()),
        }
    }
}

/// Source of environment values
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Options explicitly supplied by the caller
///
/// Values are kept as strings, the same shape environment variables have, so
/// both sources go through the same parsing. The logger and transport are
/// collaborators rather than values and are held separately.
#[derive(Clone, Default)]
pub struct Options {
    values: Vec<(String, String)>,
    logger: Option<Arc<dyn Logger>>,
    http: Option<Arc<dyn Transport>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option by name. Unknown names are kept so they can be
    /// reported; they never fail construction.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
        self
    }

    pub fn client_id(self, client_id: impl Into<String>) -> Self {
        self.set("clientId", client_id)
    }

    pub fn client_secret(self, client_secret: impl Into<String>) -> Self {
        self.set("clientSecret", client_secret)
    }

    pub fn log_level(self, log_level: LogLevel) -> Self {
        self.set("logLevel", log_level.as_str())
    }

    pub fn hostname(self, hostname: Hostname) -> Self {
        self.set("hostname", hostname.as_str())
    }

    pub fn host(self, host: impl Into<String>) -> Self {
        self.set("host", host)
    }

    pub fn port(self, port: u16) -> Self {
        self.set("port", port.to_string())
    }

    pub fn ssl(self, ssl: bool) -> Self {
        self.set("ssl", ssl.to_string())
    }

    pub fn custom_app_id(self, app_id: impl Into<String>) -> Self {
        self.set("customAppId", app_id)
    }

    pub fn custom_app_version(self, app_version: impl Into<String>) -> Self {
        self.set("customAppVersion", app_version)
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self.mark_supplied("logger")
    }

    pub fn http(mut self, http: Arc<dyn Transport>) -> Self {
        self.http = Some(http);
        self.mark_supplied("http")
    }

    fn mark_supplied(mut self, key: &str) -> Self {
        if !self.values.iter().any(|(existing, _)| existing == key) {
            self.values.push((key.to_string(), String::new()));
        }
        self
    }

    /// Explicit value for a key; empty strings count as absent
    fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Every explicitly supplied key, in the order it was first set
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(key, _)| key.as_str())
    }

    /// Supplied keys the client does not recognize
    pub fn unrecognized_keys(&self) -> Vec<&str> {
        self.keys()
            .filter(|key| !RECOGNIZED_OPTIONS.contains(key))
            .collect()
    }

    pub(crate) fn supplied_logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.clone()
    }

    pub(crate) fn supplied_http(&self) -> Option<Arc<dyn Transport>> {
        self.http.clone()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Options::new(), |options, (key, value)| options.set(key, value))
    }
}

impl<'de> Deserialize<'de> for Options {
    /// Accepts a JSON-style option bag. Non-string scalars are stringified
    /// and nulls are skipped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(text) => Some((key, text)),
                other => Some((key, other.to_string())),
            })
            .collect())
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.keys().collect();
        f.debug_struct("Options")
            .field("keys", &keys)
            .field("logger", &self.logger.is_some())
            .field("http", &self.http.is_some())
            .finish()
    }
}

/// Fully resolved client settings
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub hostname: Hostname,
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub log_level: LogLevel,
    pub custom_app_id: Option<String>,
    pub custom_app_version: Option<String>,
}

fn default_port() -> u16 {
    443
}

fn default_ssl() -> bool {
    true
}

impl ClientConfig {
    /// Resolves settings from explicit options, then the environment, then
    /// defaults
    pub fn resolve(options: &Options, env: &dyn Environment) -> Result<Self, ConfigError> {
        let resolver = Resolver { options, env };

        let client_id = resolver.required("clientId")?;
        let client_secret = resolver.required("clientSecret")?;
        let log_level: LogLevel = resolver.parsed("logLevel")?.unwrap_or_default();
        let hostname: Hostname = resolver.parsed("hostname")?.unwrap_or_default();
        let host = resolver
            .optional("host")
            .unwrap_or_else(|| hostname.host().to_string());
        let port: u16 = resolver.parsed("port")?.unwrap_or_else(default_port);
        let ssl: bool = resolver.parsed("ssl")?.unwrap_or_else(default_ssl);

        Ok(Self {
            client_id,
            client_secret,
            hostname,
            host,
            port,
            ssl,
            log_level,
            custom_app_id: resolver.optional("customAppId"),
            custom_app_version: resolver.optional("customAppVersion"),
        })
    }

    /// True when logging at debug level
    pub fn debug(&self) -> bool {
        self.log_level == LogLevel::Debug
    }

    /// True when logging at warn or debug level
    pub fn warn(&self) -> bool {
        self.log_level == LogLevel::Warn || self.debug()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("log_level", &self.log_level)
            .field("custom_app_id", &self.custom_app_id)
            .field("custom_app_version", &self.custom_app_version)
            .finish()
    }
}

/// Logs every unrecognized option when the level is warn or debug
pub fn warn_on_unrecognized_options(options: &Options, config: &ClientConfig, logger: &dyn Logger) {
    if !config.warn() {
        return;
    }
    for key in options.unrecognized_keys() {
        logger.log(&format!("Unrecognized option: {key}"));
    }
}

struct Resolver<'a> {
    options: &'a Options,
    env: &'a dyn Environment,
}

impl Resolver<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        if let Some(value) = self.options.get(key) {
            return Some(value.to_string());
        }
        self.env.var(&env_key(key)).filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::MissingCredential(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.optional(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ConfigError::InvalidOption { key, value: raw })
            })
            .transpose()
    }
}

/// `customAppId` → `AMADEUS_CUSTOM_APP_ID`
pub fn env_key(key: &str) -> String {
    let mut env_key = String::with_capacity(ENV_PREFIX.len() + key.len() + 4);
    env_key.push_str(ENV_PREFIX);
    env_key.push('_');
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            env_key.push('_');
        }
        env_key.push(c.to_ascii_uppercase());
    }
    env_key
}
