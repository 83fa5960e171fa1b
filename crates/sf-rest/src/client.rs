//! REST client for record operations.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use sf_ops_client::security::{names, url as url_security};
use sf_ops_client::{ClientConfig, QueryResult, SalesforceClient};

use crate::describe::DescribeSObjectResult;
use crate::error::{Error, ErrorKind, Result};
use crate::sobject::{join_messages, CreateResult, UpdateResult, UpsertResult};

/// Salesforce REST API client.
///
/// Every method validates the sObject and field names it interpolates into
/// the request path before sending anything.
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: SalesforceClient,
}

impl SalesforceRestClient {
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
        Ok(Self { client })
    }

    /// Wrap an existing base client.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    /// The underlying base client.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Instance URL requests are sent to.
    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    /// API version used in request paths.
    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    /// Fetch the describe metadata of `sobject`.
    #[instrument(skip(self))]
    pub async fn describe_sobject(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        check_sobject(sobject)?;
        let describe = self
            .client
            .rest_get(&format!("sobjects/{}/describe", sobject))
            .await?;
        Ok(describe)
    }

    /// Insert one record. A `success: false` answer becomes an error.
    #[instrument(skip(self, record))]
    pub async fn create<T: Serialize>(&self, sobject: &str, record: &T) -> Result<CreateResult> {
        check_sobject(sobject)?;
        let url = self.client.rest_url(&format!("sobjects/{}", sobject));
        let result: CreateResult = self.client.post_json(&url, record).await?;

        if !result.success {
            return Err(Error::new(ErrorKind::Salesforce {
                error_code: "CREATE_FAILED".to_string(),
                message: join_messages(&result.errors),
            }));
        }
        debug!(id = %result.id, "Record created");
        Ok(result)
    }

    /// Update the record `id`. Salesforce answers 204 with no body.
    #[instrument(skip(self, record))]
    pub async fn update<T: Serialize>(
        &self,
        sobject: &str,
        id: &str,
        record: &T,
    ) -> Result<UpdateResult> {
        check_sobject(sobject)?;
        if !url_security::is_valid_salesforce_id(id) {
            return Err(Error::new(ErrorKind::InvalidInput(format!(
                "invalid record id: {id:?}"
            ))));
        }
        let url = self.client.rest_url(&format!("sobjects/{}/{}", sobject, id));
        self.client.patch_json(&url, record).await?;

        Ok(UpdateResult {
            id: id.to_string(),
            success: true,
            errors: Vec::new(),
        })
    }

    /// Insert or update by external id.
    ///
    /// 201 means a record was created; 200 (newer API versions) or 204 means
    /// an existing one was updated.
    #[instrument(skip(self, record))]
    pub async fn upsert<T: Serialize>(
        &self,
        sobject: &str,
        external_id_field: &str,
        external_id_value: &str,
        record: &T,
    ) -> Result<UpsertResult> {
        check_sobject(sobject)?;
        if !names::is_safe_field_name(external_id_field) {
            return Err(Error::invalid_field(external_id_field));
        }

        let url = self.client.rest_url(&format!(
            "sobjects/{}/{}/{}",
            sobject,
            external_id_field,
            url_security::encode_param(external_id_value)
        ));
        let response = self.client.patch_json(&url, record).await?;
        let status = response.status();

        let result = match status {
            204 => UpsertResult {
                id: None,
                success: true,
                created: false,
                errors: Vec::new(),
            },
            200 | 201 => {
                let mut result: UpsertResult = response.json().await?;
                result.created |= status == 201;
                result
            }
            other => {
                return Err(Error::new(ErrorKind::Salesforce {
                    error_code: "UPSERT_FAILED".to_string(),
                    message: format!("unexpected status {}", other),
                }))
            }
        };

        if !result.success {
            return Err(Error::new(ErrorKind::Salesforce {
                error_code: "UPSERT_FAILED".to_string(),
                message: join_messages(&result.errors),
            }));
        }
        Ok(result)
    }

    /// Run a SOQL query and read every page.
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        Ok(self.client.query_all(soql).await?)
    }
}

fn check_sobject(sobject: &str) -> Result<()> {
    if names::is_safe_sobject_name(sobject) {
        Ok(())
    } else {
        Err(Error::invalid_sobject(sobject))
    }
}
