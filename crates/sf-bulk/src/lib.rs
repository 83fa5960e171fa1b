//! # sf-ops-bulk
//!
//! Bulk API 2.0 ingest jobs: upload JSON rows as CSV, wait for the job and
//! read back per-row results.
//!
//! ```rust,ignore
//! use sf_ops_bulk::{BulkApiClient, BulkOperation};
//!
//! let bulk = BulkApiClient::new("https://myorg.my.salesforce.com", "token")?;
//! let rows = vec![serde_json::json!({"LastName": "Lovelace"})];
//! let result = bulk
//!     .execute_ingest("Contact", BulkOperation::Insert, &rows, None)
//!     .await?;
//! ```

mod client;
mod error;
mod rows;
mod types;

pub use client::{BulkApiClient, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use error::{Error, ErrorKind, Result};
pub use rows::{decode_results, encode_rows, ResultKind, NULL_MARKER};
pub use types::{
    BulkOperation, BulkRowResult, CreateIngestJobRequest, IngestJob, IngestResult, JobState,
};
