//! Error types for sf-ops-common.

use serde_json::Value;

/// Result type alias for operations over a job state.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by an operation or combinator.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(message.into()))
    }

    /// Wrap a failure from a remote call, keeping it as the source.
    pub fn remote(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::with_source(ErrorKind::Remote(source.to_string()), source)
    }

    /// The payload carried by a [`ErrorKind::Rejected`] error.
    pub fn payload(&self) -> Option<&Value> {
        match &self.kind {
            ErrorKind::Rejected { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or malformed configuration. Raised before any remote call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation needed a session and the state carries none.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid path expression: {0}")]
    Path(String),

    #[error("No reference at position {position} ({len} recorded)")]
    Reference { position: usize, len: usize },

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    /// The remote call went through but its result is treated as a failure,
    /// e.g. a bulk job with failed rows. `payload` holds the full result.
    #[error("{message}")]
    Rejected { message: String, payload: Value },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Other(err.to_string()), err)
    }
}
