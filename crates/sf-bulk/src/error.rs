//! Error types for sf-ops-bulk.

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
    #[error("Client error: {0}")]
    Client(String),
    /// The job reached `Failed` or `Aborted`.
    #[error("Job {job_id} ended in state {state}: {message}")]
    Job {
        job_id: String,
        state: String,
        message: String,
    },
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sf_ops_client::Error> for Error {
    fn from(err: sf_ops_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.kind.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}
