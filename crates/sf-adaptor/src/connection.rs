//! The session seam between operations and a Salesforce org.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use sf_ops_bulk::{BulkOperation, BulkRowResult, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use sf_ops_common::{Result, State};
use sf_ops_rest::DescribeSObjectResult;

/// A record, as sent to the API.
pub type Record = Map<String, Value>;

/// An org session. Results come back as the raw JSON recorded in
/// `references`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Authenticate. `password` already has any security token appended.
    async fn login(&self, username: &str, password: &str) -> Result<()>;

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult>;

    /// `{id, success, errors}`
    async fn create(&self, sobject: &str, record: &Record) -> Result<Value>;

    /// `record` must carry the `Id` of the record to update.
    async fn update(&self, sobject: &str, record: &Record) -> Result<Value>;

    /// `record` must carry a value for `external_id_field`.
    async fn upsert(&self, sobject: &str, external_id_field: &str, record: &Record)
        -> Result<Value>;

    /// `{totalSize, done, records}` with every page read.
    async fn query(&self, soql: &str) -> Result<Value>;

    /// Run one ingest job and return per-row results.
    async fn bulk(
        &self,
        sobject: &str,
        operation: BulkOperation,
        rows: &[Value],
        settings: &BulkSettings,
    ) -> Result<Vec<BulkRowResult>>;
}

/// The session handle carried on the state.
pub type Session = Arc<dyn Connection>;

/// State of a Salesforce job.
pub type SalesforceState = State<Session>;

/// Job settings passed down to a bulk call.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkSettings {
    pub external_id_field: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            external_id_field: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}
