//! Session-bound Salesforce client.
//!
//! Holds the instance URL and session token obtained at login and attaches
//! the token to every request. The token never appears in Debug output.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{RequestBuilder, SfHttpClient};
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// Authenticated client for one Salesforce org.
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    session_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("session_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
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
        Ok(Self::from_http(
            SfHttpClient::new(config)?,
            instance_url,
            session_token,
        ))
    }

    /// Reuse an existing transport, e.g. the one that performed the login.
    pub fn from_http(
        http: SfHttpClient,
        instance_url: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Override the API version used in request paths.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Instance URL requests are sent to.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Bearer token sent with every request.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// API version used in request paths.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The underlying transport.
    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    /// Resolve `path` against the instance URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.instance_url, path.trim_start_matches('/'))
        }
    }

    /// `rest_url("sobjects/Account")` -> `{instance}/services/data/v62.0/sobjects/Account`
    pub fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// `bulk_url("ingest")` -> `{instance}/services/data/v62.0/jobs/ingest`
    pub fn bulk_url(&self, path: &str) -> String {
        self.rest_url(&format!("jobs/{}", path.trim_start_matches('/')))
    }

    /// Authenticated GET builder.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(self.url(url)).bearer_auth(&self.session_token)
    }

    /// Authenticated POST builder.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(self.url(url)).bearer_auth(&self.session_token)
    }

    /// Authenticated PATCH builder.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(self.url(url)).bearer_auth(&self.session_token)
    }

    /// Authenticated PUT builder.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(self.url(url)).bearer_auth(&self.session_token)
    }

    /// Authenticated DELETE builder.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(self.url(url)).bearer_auth(&self.session_token)
    }

    /// Send `request`, mapping error statuses to errors.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    /// GET and decode the JSON body.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.execute(self.get(url)).await?.json().await
    }

    /// GET a path under the REST base URL.
    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json(&self.rest_url(path)).await
    }

    /// GET returning the body as text, for CSV result sets.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.execute(self.get(url).header("Accept", "text/csv"))
            .await?
            .text()
            .await
    }

    /// POST a JSON body and decode the JSON answer.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.post(url).json(body)?).await?.json().await
    }

    /// PATCH with a JSON body. The response is returned as-is so callers can
    /// tell 201 (created, with body) from 204 (updated, empty).
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn patch_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Response> {
        self.execute(self.patch(url).json(body)?).await
    }

    /// PUT a CSV payload; the response body is discarded.
    #[instrument(skip(self, csv), fields(url = %url, bytes = csv.len()))]
    pub async fn put_csv(&self, url: &str, csv: String) -> Result<()> {
        self.execute(self.put(url).csv(csv)).await?;
        Ok(())
    }

    /// Run a SOQL query and return its first page.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let url = format!("{}?q={}", self.rest_url("query"), urlencoding::encode(soql));
        self.get_json(&url).await
    }

    /// Run a SOQL query, following `nextRecordsUrl` until every page is read.
    /// The returned result has `done == true` and all records in order.
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let mut result: QueryResult<T> = self.query(soql).await?;
        let mut records = std::mem::take(&mut result.records);

        while let Some(next) = result.next_records_url.take() {
            debug!(next = %next, fetched = records.len(), "Fetching next query page");
            result = self.get_json(&next).await?;
            records.append(&mut result.records);
        }

        Ok(QueryResult {
            total_size: result.total_size,
            done: true,
            next_records_url: None,
            records,
        })
    }
}

/// One page of SOQL query results.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub total_size: u64,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    pub records: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_building() {
        let client = SalesforceClient::new("https://na1.salesforce.com/", "token").unwrap();

        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(
            client.url("/services/Soap/u/62.0"),
            "https://na1.salesforce.com/services/Soap/u/62.0"
        );
        assert_eq!(client.url("https://other.com/x"), "https://other.com/x");
        assert_eq!(
            client.rest_url("sobjects/Account"),
            "https://na1.salesforce.com/services/data/v62.0/sobjects/Account"
        );
        assert_eq!(
            client.bulk_url("ingest/750xx/batches"),
            "https://na1.salesforce.com/services/data/v62.0/jobs/ingest/750xx/batches"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = SalesforceClient::new("https://na1.salesforce.com", "00Dxx!secret")
            .unwrap()
            .with_api_version("58.0");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("58.0"));
    }

    #[tokio::test]
    async fn test_query_all_follows_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/query"))
            .and(query_param("q", "SELECT Id FROM Account"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalSize": 3,
                "done": false,
                "nextRecordsUrl": "/services/data/v62.0/query/01gxx-2000",
                "records": [{"Id": "001A"}, {"Id": "001B"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/query/01gxx-2000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalSize": 3,
                "done": true,
                "records": [{"Id": "001C"}]
            })))
            .mount(&server)
            .await;

        let client = SalesforceClient::new(server.uri(), "tok").unwrap();
        let result: QueryResult<Value> = client.query_all("SELECT Id FROM Account").await.unwrap();

        assert!(result.done);
        assert_eq!(result.total_size, 3);
        let ids: Vec<_> = result.records.iter().map(|r| r["Id"].clone()).collect();
        assert_eq!(ids, vec![json!("001A"), json!("001B"), json!("001C")]);
    }

    #[tokio::test]
    async fn test_patch_returns_raw_status() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v62.0/sobjects/Account/001A"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = SalesforceClient::new(server.uri(), "tok").unwrap();
        let response = client
            .patch_json(&client.rest_url("sobjects/Account/001A"), &json!({"Name": "Acme"}))
            .await
            .unwrap();

        assert_eq!(response.status(), 204);
    }
}
