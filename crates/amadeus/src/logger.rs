//! Logger collaborator used for request/response diagnostics
//!
//! The client never writes diagnostics anywhere directly. Everything gated by
//! the configured log level goes through a `Logger`, which defaults to
//! forwarding into `tracing`.

/// A console-compatible sink accepting `log`, `error` and `debug` calls
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);

    fn error(&self, message: &str);

    fn debug(&self, message: &str);
}

/// Default logger forwarding to `tracing` under the `amadeus` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "amadeus", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "amadeus", "{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "amadeus", "{message}");
    }
}
