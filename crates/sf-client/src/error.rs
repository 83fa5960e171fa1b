//! Error types for sf-ops-client.

use std::time::Duration;

/// Result type alias for sf-ops-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Underlying cause, if any.
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

    /// Returns true if the request may succeed when sent again.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// True for a rate limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// True when the session was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Server-requested wait before the next attempt, for 429 responses.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// The kind of transport error.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {:?}", d)).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401, usually an expired or revoked session.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Error payload returned by the Salesforce API (`[{errorCode, message, fields}]`).
    #[error("Salesforce API error: {error_code} - {message}")]
    SalesforceApi {
        error_code: String,
        message: String,
        fields: Vec<String>,
    },

    #[error("All {attempts} retry attempts exhausted")]
    RetriesExhausted { attempts: u32 },

    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Transient failures worth sending again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::RateLimited { .. } | ErrorKind::Timeout | ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(Error::new(ErrorKind::RateLimited { retry_after: None }).is_retryable());
        assert!(Error::new(ErrorKind::Timeout).is_retryable());
        assert!(Error::new(ErrorKind::Connection("reset".into())).is_retryable());
        assert!(!Error::new(ErrorKind::NotFound("Account".into())).is_retryable());
        assert!(!Error::new(ErrorKind::Authentication("INVALID_SESSION_ID".into())).is_retryable());
    }

    #[test]
    fn test_retryable_http_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = Error::new(ErrorKind::Http {
                status,
                message: "error".into(),
            });
            assert!(err.is_retryable(), "HTTP {status} should be retryable");
        }

        for status in [400, 401, 403, 404, 409] {
            let err = Error::new(ErrorKind::Http {
                status,
                message: "error".into(),
            });
            assert!(!err.is_retryable(), "HTTP {status} should not be retryable");
        }
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let err = Error::new(ErrorKind::RateLimited {
            retry_after: Some(Duration::from_secs(20)),
        });
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(20)));
        assert!(err.to_string().contains("retry after"));

        assert_eq!(Error::new(ErrorKind::Timeout).retry_after(), None);
    }

    #[test]
    fn test_salesforce_api_error_display() {
        let err = Error::new(ErrorKind::SalesforceApi {
            error_code: "REQUIRED_FIELD_MISSING".to_string(),
            message: "Required fields are missing: [LastName]".to_string(),
            fields: vec!["LastName".to_string()],
        });

        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Salesforce API error: REQUIRED_FIELD_MISSING - Required fields are missing: [LastName]"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: Error = url::Url::parse("login.salesforce.com").unwrap_err().into();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
        assert!(err.to_string().contains("Invalid URL"));
    }
}
