use thiserror::Error;

/// Error taxonomy for the screening pipeline.
///
/// Only `Config` is fatal; everything else is recoverable at the
/// per-ticker (or per-sink) boundary and logged by the orchestrator.
#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider returned no usable data: {0}")]
    ProviderEmpty(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Sink failure: {0}")]
    SinkFailure(String),
}

impl ScreenError {
    /// Fatal errors terminate the run; the rest skip a ticker or a sink.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScreenError::Config(_))
    }
}
