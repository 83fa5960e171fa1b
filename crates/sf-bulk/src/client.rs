//! Bulk API 2.0 ingest client.

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use sf_ops_client::security::names;
use sf_ops_client::{ClientConfig, SalesforceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::rows::{decode_results, encode_rows, ResultKind};
use crate::types::*;

/// Default interval between job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default time to wait for a job to reach a terminal state.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Bulk API 2.0 client for ingest jobs.
///
/// ```rust,ignore
/// use sf_ops_bulk::{BulkApiClient, BulkOperation};
///
/// let bulk = BulkApiClient::from_client(client);
/// let result = bulk
///     .execute_ingest("Contact", BulkOperation::Insert, &rows, None)
///     .await?;
/// println!("{} ok, {} failed", result.successes.len(), result.failures.len());
/// ```
#[derive(Debug, Clone)]
pub struct BulkApiClient {
    client: SalesforceClient,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl BulkApiClient {
    /// Client for `instance_url` authenticated with `session_token`.
    pub fn new(instance_url: impl Into<String>, session_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, session_token, ClientConfig::default())
    }

    /// Like [`new`](Self::new) with a custom transport configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        session_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, session_token, config)?;
        Ok(Self::from_client(client))
    }

    /// Wrap an existing base client with the default poll timings.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// The underlying base client.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Delay between job status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Maximum time to wait for a job to finish.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    fn job_url(&self, job_id: &str, suffix: &str) -> String {
        let base = format!("{}/{}", self.client.bulk_url("ingest"), job_id);
        if suffix.is_empty() {
            base
        } else {
            format!("{}/{}", base, suffix)
        }
    }

    /// Open an ingest job.
    #[instrument(skip(self, request), fields(object = %request.object, operation = %request.operation))]
    pub async fn create_ingest_job(&self, request: CreateIngestJobRequest) -> Result<IngestJob> {
        let job: IngestJob = self
            .client
            .post_json(&self.client.bulk_url("ingest"), &request)
            .await?;
        debug!(job_id = %job.id, "Ingest job created");
        Ok(job)
    }

    /// Upload the CSV rows of an open job.
    #[instrument(skip(self, csv))]
    pub async fn upload_job_data(&self, job_id: &str, csv: String) -> Result<()> {
        self.client
            .put_csv(&self.job_url(job_id, "batches"), csv)
            .await?;
        Ok(())
    }

    /// Mark the upload complete so the job starts processing.
    #[instrument(skip(self))]
    pub async fn close_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.set_state(job_id, JobState::UploadComplete).await
    }

    /// Abort a job.
    #[instrument(skip(self))]
    pub async fn abort_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.set_state(job_id, JobState::Aborted).await
    }

    async fn set_state(&self, job_id: &str, state: JobState) -> Result<IngestJob> {
        let response = self
            .client
            .patch_json(&self.job_url(job_id, ""), &UpdateJobStateRequest { state })
            .await?;
        Ok(response.json().await?)
    }

    /// Current job info.
    #[instrument(skip(self))]
    pub async fn get_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        Ok(self.client.get_json(&self.job_url(job_id, "")).await?)
    }

    /// Poll until the job is terminal or the poll timeout elapses.
    #[instrument(skip(self))]
    pub async fn wait_for_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        let start = Instant::now();

        loop {
            let job = self.get_ingest_job(job_id).await?;
            if job.state.is_terminal() {
                return Ok(job);
            }

            if start.elapsed() + self.poll_interval > self.poll_timeout {
                return Err(Error::new(ErrorKind::Timeout(format!(
                    "job {} still {:?} after {:?}",
                    job_id, job.state, self.poll_timeout
                ))));
            }

            debug!(job_id, state = ?job.state, processed = job.number_records_processed, "Waiting for job");
            sleep(self.poll_interval).await;
        }
    }

    async fn results(&self, job_id: &str, kind: ResultKind) -> Result<Vec<BulkRowResult>> {
        let suffix = match kind {
            ResultKind::Successful => "successfulResults",
            ResultKind::Failed => "failedResults",
            ResultKind::Unprocessed => "unprocessedrecords",
        };
        let csv = self.client.get_text(&self.job_url(job_id, suffix)).await?;
        decode_results(&csv, kind)
    }

    /// Rows the job processed successfully.
    pub async fn get_successful_results(&self, job_id: &str) -> Result<Vec<BulkRowResult>> {
        self.results(job_id, ResultKind::Successful).await
    }

    /// Rows the job rejected, with their error.
    pub async fn get_failed_results(&self, job_id: &str) -> Result<Vec<BulkRowResult>> {
        self.results(job_id, ResultKind::Failed).await
    }

    /// Rows the job never got to.
    pub async fn get_unprocessed_records(&self, job_id: &str) -> Result<Vec<BulkRowResult>> {
        self.results(job_id, ResultKind::Unprocessed).await
    }

    /// Run a whole ingest: create the job, upload `rows` as one batch, close,
    /// wait, and collect per-row results.
    ///
    /// A job that ends `Failed` or `Aborted` is an error. Row-level failures
    /// are not; they come back in [`IngestResult::failures`].
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn execute_ingest(
        &self,
        sobject: &str,
        operation: BulkOperation,
        rows: &[Value],
        external_id_field: Option<&str>,
    ) -> Result<IngestResult> {
        if !names::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::InvalidInput(format!(
                "invalid sObject name: {sobject:?}"
            ))));
        }

        let mut request = CreateIngestJobRequest::new(sobject, operation);
        if let Some(field) = external_id_field {
            request = request.with_external_id_field(field);
        } else if operation == BulkOperation::Upsert {
            return Err(Error::new(ErrorKind::InvalidInput(
                "upsert requires an external id field".to_string(),
            )));
        }

        let csv = encode_rows(rows)?;
        let job = self.create_ingest_job(request).await?;
        self.upload_job_data(&job.id, csv).await?;
        self.close_ingest_job(&job.id).await?;

        let job = match self.wait_for_ingest_job(&job.id).await {
            Ok(job) => job,
            Err(err) => {
                if matches!(err.kind, ErrorKind::Timeout(_)) {
                    if let Err(abort_err) = self.abort_ingest_job(&job.id).await {
                        warn!(job_id = %job.id, error = %abort_err, "Could not abort timed out job");
                    }
                }
                return Err(err);
            }
        };

        if !job.state.is_success() {
            return Err(Error::new(ErrorKind::Job {
                job_id: job.id.clone(),
                state: format!("{:?}", job.state),
                message: job.error_message.clone().unwrap_or_default(),
            }));
        }

        let successes = self.get_successful_results(&job.id).await?;
        let mut failures = self.get_failed_results(&job.id).await?;
        failures.extend(self.get_unprocessed_records(&job.id).await?);

        info!(
            job_id = %job.id,
            succeeded = successes.len(),
            failed = failures.len(),
            "Ingest job finished"
        );

        Ok(IngestResult {
            job,
            successes,
            failures,
        })
    }
}
