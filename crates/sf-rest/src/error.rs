//! Error types for sf-ops-rest.

pub type Result<T> = std::result::Result<T, Error>;

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

    pub(crate) fn invalid_sobject(name: &str) -> Self {
        Self::new(ErrorKind::InvalidInput(format!("invalid sObject name: {name:?}")))
    }

    pub(crate) fn invalid_field(name: &str) -> Self {
        Self::new(ErrorKind::InvalidInput(format!("invalid field name: {name:?}")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Transport or API failure surfaced by the HTTP client.
    #[error("{0}")]
    Client(String),

    /// The API accepted the request but reported `success: false`.
    #[error("Salesforce error: {error_code} - {message}")]
    Salesforce { error_code: String, message: String },

    /// Rejected locally before any request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sf_ops_client::Error> for Error {
    fn from(err: sf_ops_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.kind.to_string()), err)
    }
}
