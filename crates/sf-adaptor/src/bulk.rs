//! Bulk job submission.

use std::time::Duration;

use async_trait::async_trait;

use sf_ops_bulk::{BulkOperation, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use sf_ops_common::{DataSource, Error, ErrorKind, Operation, Result};

use crate::connection::{BulkSettings, SalesforceState, Session};

/// Options for [`bulk`].
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Fail the step when any row fails, carrying every row result.
    pub fail_on_error: bool,
    /// Skip the job entirely when there are no rows.
    pub allow_no_op: bool,
    /// Match field, required for upserts.
    pub external_id_field: Option<String>,
    /// Delay between job status checks.
    pub poll_interval: Duration,
    /// Give up waiting for the job after this long.
    pub poll_timeout: Duration,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            fail_on_error: false,
            allow_no_op: false,
            external_id_field: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl BulkOptions {
    /// Default options: no upsert key, failures recorded rather than raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the step when any row fails.
    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// Skip the job when there are no rows.
    pub fn allow_no_op(mut self, allow_no_op: bool) -> Self {
        self.allow_no_op = allow_no_op;
        self
    }

    /// Match field for upserts.
    pub fn external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = Some(field.into());
        self
    }

    /// Delay between job status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Maximum time to wait for the job to finish.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    fn settings(&self) -> BulkSettings {
        BulkSettings {
            external_id_field: self.external_id_field.clone(),
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
        }
    }
}

/// See [`bulk`].
pub struct Bulk {
    sobject: String,
    operation: BulkOperation,
    options: BulkOptions,
    rows: DataSource<Session>,
}

/// Submit the rows produced by `rows` as one bulk job on `sobject`.
///
/// The full per-row result array is recorded as one reference. With
/// `fail_on_error`, any failed row turns the step into a
/// [`ErrorKind::Rejected`] error whose payload is that same array.
///
/// ```rust,ignore
/// bulk(
///     "Contact",
///     BulkOperation::Upsert,
///     BulkOptions::new().external_id_field("Ext_UID__c").fail_on_error(true),
///     "$.data.contacts[*]",
/// )
/// ```
pub fn bulk(
    sobject: impl Into<String>,
    operation: BulkOperation,
    options: BulkOptions,
    rows: impl Into<DataSource<Session>>,
) -> Bulk {
    Bulk {
        sobject: sobject.into(),
        operation,
        options,
        rows: rows.into(),
    }
}

#[async_trait]
impl Operation<Session> for Bulk {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        let rows = self.rows.items(&state)?;
        if rows.is_empty() && self.options.allow_no_op {
            state.logger.info("No items in array. Skipping bulk job.");
            return Ok(state);
        }

        state.logger.info(format!(
            "Creating bulk {} job for {} with {} row(s)",
            self.operation,
            self.sobject,
            rows.len()
        ));

        let results = state
            .connection()?
            .bulk(&self.sobject, self.operation, &rows, &self.options.settings())
            .await?;

        let failed = results.iter().filter(|r| !r.success).count();
        state.logger.info(format!(
            "Bulk job finished: {} succeeded, {} failed",
            results.len() - failed,
            failed
        ));

        let payload = serde_json::to_value(&results)?;
        if failed > 0 && self.options.fail_on_error {
            state.logger.error(format!("{} row(s) failed", failed));
            return Err(Error::new(ErrorKind::Rejected {
                message: format!(
                    "Bulk {} on {}: {} of {} row(s) failed",
                    self.operation,
                    self.sobject,
                    failed,
                    results.len()
                ),
                payload,
            }));
        }

        Ok(state.push_reference(payload))
    }
}
