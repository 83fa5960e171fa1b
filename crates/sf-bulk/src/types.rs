//! Bulk API 2.0 ingest types.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind};

/// The API reports `apiVersion` as either `59.0` or `"59.0"`.
fn deserialize_api_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Number(f64),
        Text(String),
    }

    Ok(Option::<Version>::deserialize(deserializer)?.map(|v| match v {
        Version::Number(n) => format!("{:.1}", n),
        Version::Text(s) => s,
    }))
}

/// Ingest job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Open,
    UploadComplete,
    InProgress,
    Aborted,
    JobComplete,
    Failed,
}

impl JobState {
    /// True once the job will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Aborted | JobState::JobComplete | JobState::Failed)
    }

    /// True when the job completed.
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::JobComplete)
    }
}

/// Ingest operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    Insert,
    Update,
    Upsert,
    Delete,
    HardDelete,
}

impl BulkOperation {
    /// Name used on the wire.
    pub fn api_name(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
            BulkOperation::HardDelete => "hardDelete",
        }
    }
}

impl std::fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for BulkOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "insert" => Ok(BulkOperation::Insert),
            "update" => Ok(BulkOperation::Update),
            "upsert" => Ok(BulkOperation::Upsert),
            "delete" => Ok(BulkOperation::Delete),
            "harddelete" => Ok(BulkOperation::HardDelete),
            _ => Err(Error::new(ErrorKind::InvalidInput(format!(
                "unknown bulk operation: {s}"
            )))),
        }
    }
}

/// Body of `POST jobs/ingest`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    pub object: String,
    pub operation: BulkOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub content_type: &'static str,
    pub column_delimiter: &'static str,
    pub line_ending: &'static str,
}

impl CreateIngestJobRequest {
    /// A CSV job request for `operation` on `sobject`.
    pub fn new(sobject: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: sobject.into(),
            operation,
            external_id_field_name: None,
            content_type: "CSV",
            column_delimiter: "COMMA",
            line_ending: "LF",
        }
    }

    /// Match field for upserts.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }
}

/// Body of `PATCH jobs/ingest/{id}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateJobStateRequest {
    pub state: JobState,
}

/// Job info as returned by the ingest endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJob {
    pub id: String,
    pub state: JobState,
    pub object: String,
    pub operation: String,
    #[serde(default)]
    pub number_records_processed: i64,
    #[serde(default)]
    pub number_records_failed: i64,
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Outcome of one uploaded row.
///
/// Serialized as `{success, created, id, error, ...row fields}`, the shape
/// recorded in job references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRowResult {
    pub success: bool,
    #[serde(default)]
    pub created: bool,
    pub id: Option<String>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Per-row results of a finished ingest job.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub job: IngestJob,
    pub successes: Vec<BulkRowResult>,
    /// Failed rows followed by rows the job never processed.
    pub failures: Vec<BulkRowResult>,
}

impl IngestResult {
    /// True when any row failed or was left unprocessed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Successes then failures, as one list.
    pub fn into_rows(self) -> Vec<BulkRowResult> {
        let mut rows = self.successes;
        rows.extend(self.failures);
        rows
    }
}
