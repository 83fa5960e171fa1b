//! [`Connection`] backed by the REST and Bulk APIs.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use sf_ops_auth::{Credentials, LoginConfig, SalesforceCredentials, SoapLogin};
use sf_ops_bulk::{BulkApiClient, BulkOperation, BulkRowResult};
use sf_ops_client::{ClientConfig, SalesforceClient, SfHttpClient};
use sf_ops_common::{Error, ErrorKind, Result};
use sf_ops_rest::{DescribeSObjectResult, QueryResult, SalesforceRestClient};

use crate::connection::{BulkSettings, Connection, Record};

/// Session state set by `login`.
#[derive(Debug, Clone)]
struct LoggedIn {
    credentials: SalesforceCredentials,
    client: SalesforceClient,
}

/// A connection to one org.
///
/// Created unauthenticated from a login URL; [`Connection::login`] exchanges
/// username and password for a session that every later call uses.
pub struct SalesforceConnection {
    login_url: String,
    api_version: String,
    http: SfHttpClient,
    session: RwLock<Option<LoggedIn>>,
}

impl std::fmt::Debug for SalesforceConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceConnection")
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceConnection {
    /// A connection whose transport sends each request exactly once; a
    /// 429/5xx surfaces as an error and is never resent.
    pub fn new(login_url: impl Into<String>, api_version: impl Into<String>) -> Result<Self> {
        Self::with_config(
            login_url,
            api_version,
            ClientConfig::builder().without_retry().build(),
        )
    }

    /// A connection over a custom transport configuration.
    pub fn with_config(
        login_url: impl Into<String>,
        api_version: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            login_url: login_url.into(),
            api_version: api_version.into(),
            http: SfHttpClient::new(config).map_err(Error::remote)?,
            session: RwLock::new(None),
        })
    }

    /// Instance URL of the current session, if logged in.
    pub async fn instance_url(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.credentials.instance_url().to_string())
    }

    async fn client(&self) -> Result<SalesforceClient> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.client.clone())
            .ok_or_else(|| {
                Error::new(ErrorKind::Connection(
                    "not logged in; run login first".to_string(),
                ))
            })
    }

    async fn rest(&self) -> Result<SalesforceRestClient> {
        Ok(SalesforceRestClient::from_client(self.client().await?))
    }
}

fn to_json<T: serde::Serialize>(result: &T) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Pull `key` out of `record` as a string, leaving the rest as the body.
fn split_key(record: &Record, key: &str) -> Result<(String, Record)> {
    let mut body = record.clone();
    let value = body.remove(key).ok_or_else(|| {
        Error::new(ErrorKind::Attribute(format!("missing required attribute {key}")))
    })?;
    let value = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => {
            return Err(Error::new(ErrorKind::Attribute(format!(
                "{key} must be a string or number, got {other}"
            ))))
        }
    };
    Ok((value, body))
}

#[async_trait]
impl Connection for SalesforceConnection {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let config = LoginConfig::new(&self.login_url, username, password)
            .with_api_version(&self.api_version);
        let credentials = SoapLogin::new(self.http.clone())
            .login(&config)
            .await
            .map_err(Error::remote)?;
        debug!(instance_url = %credentials.instance_url(), "Session established");

        let client = credentials.client(self.http.clone());
        *self.session.write().await = Some(LoggedIn {
            credentials,
            client,
        });
        Ok(())
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        self.rest()
            .await?
            .describe_sobject(sobject)
            .await
            .map_err(Error::remote)
    }

    async fn create(&self, sobject: &str, record: &Record) -> Result<Value> {
        let result = self
            .rest()
            .await?
            .create(sobject, record)
            .await
            .map_err(Error::remote)?;
        to_json(&result)
    }

    async fn update(&self, sobject: &str, record: &Record) -> Result<Value> {
        let (id, body) = split_key(record, "Id")?;
        let result = self
            .rest()
            .await?
            .update(sobject, &id, &body)
            .await
            .map_err(Error::remote)?;
        to_json(&result)
    }

    async fn upsert(
        &self,
        sobject: &str,
        external_id_field: &str,
        record: &Record,
    ) -> Result<Value> {
        let (external_id, body) = split_key(record, external_id_field)?;
        let result = self
            .rest()
            .await?
            .upsert(sobject, external_id_field, &external_id, &body)
            .await
            .map_err(Error::remote)?;
        to_json(&result)
    }

    async fn query(&self, soql: &str) -> Result<Value> {
        let result: QueryResult<Value> = self
            .rest()
            .await?
            .query_all(soql)
            .await
            .map_err(Error::remote)?;
        to_json(&result)
    }

    #[instrument(skip(self, rows, settings), fields(rows = rows.len()))]
    async fn bulk(
        &self,
        sobject: &str,
        operation: BulkOperation,
        rows: &[Value],
        settings: &BulkSettings,
    ) -> Result<Vec<BulkRowResult>> {
        let bulk = BulkApiClient::from_client(self.client().await?)
            .with_poll_interval(settings.poll_interval)
            .with_poll_timeout(settings.poll_timeout);
        let result = bulk
            .execute_ingest(
                sobject,
                operation,
                rows,
                settings.external_id_field.as_deref(),
            )
            .await
            .map_err(Error::remote)?;
        Ok(result.into_rows())
    }
}
