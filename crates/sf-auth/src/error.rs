//! Error types for sf-ops-auth.
//!
//! Messages never carry passwords or session tokens.

/// Result type alias for sf-ops-auth operations.
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
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// SOAP fault returned by the login endpoint, e.g. `INVALID_LOGIN`.
    #[error("Login failed: {code} - {message}")]
    LoginFault { code: String, message: String },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The login response parsed but lacked a required element.
    #[error("Invalid login response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sf_ops_client::Error> for Error {
    fn from(err: sf_ops_client::Error) -> Self {
        Error::with_source(ErrorKind::Http(err.kind.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
