//! Raw HTTP layer: request building and retrying execution.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::response::Response;
use crate::retry::RetryPolicy;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RequestMethod {
    fn to_reqwest(self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Json(serde_json::Value),
    Text(Bytes),
}

/// A request description. Kept separate from reqwest so it can be replayed
/// on retry.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    bearer_token: Option<String>,
}

impl RequestBuilder {
    /// A request with no headers or body.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    /// Send `token` as a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set a header, replacing any previous value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON body.
    pub fn json<T: Serialize>(self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        Ok(self.json_value(value))
    }

    /// Use `body` as the JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self.header("Content-Type", "application/json")
    }

    /// CSV body, as used by Bulk API 2.0 batch uploads.
    pub fn csv(mut self, data: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(Bytes::from(data.into())));
        self.header("Content-Type", "text/csv")
    }

    /// SOAP envelope body. `action` becomes the SOAPAction header.
    pub fn soap(mut self, envelope: impl Into<String>, action: &str) -> Self {
        self.body = Some(RequestBody::Text(Bytes::from(envelope.into())));
        self.header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", action)
    }

    /// Value of header `name`, case-insensitive.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP client with retry and Salesforce error decoding.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Build the transport from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// POST builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// PATCH builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// PUT builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// DELETE builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Send a request, retrying throttled and transient failures according
    /// to the configured policy. Non-2xx responses become errors.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.execute_raw(request).await?.error_for_status().await
    }

    /// Like [`execute`](Self::execute) but hands back non-2xx responses
    /// untouched, for callers that decode their own error bodies.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute_raw(&self, request: RequestBuilder) -> Result<Response> {
        let mut policy = self.config.retry.clone().map(RetryPolicy::new);

        loop {
            match self.execute_once(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => {
                    let Some(policy) = policy.as_mut() else {
                        return Err(err);
                    };
                    match policy.next_delay(err.retry_after()) {
                        Some(delay) => {
                            warn!(
                                attempt = policy.attempt(),
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "Request failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(Error::with_source(
                                ErrorKind::RetriesExhausted {
                                    attempts: policy.attempt(),
                                },
                                err,
                            ));
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute_once(&self, request: &RequestBuilder) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        req = match &request.body {
            Some(RequestBody::Json(value)) => req.json(value),
            Some(RequestBody::Text(bytes)) => req.body(bytes.clone()),
            None => req,
        };

        if self.config.trace_requests {
            debug!(method = ?request.method, url = %request.url, "Sending request");
        }

        let response = req.send().await?;
        let status = response.status().as_u16();

        if self.config.trace_requests {
            if response.status().is_success() {
                debug!(status, "Response received");
            } else {
                info!(status, "Non-success response");
            }
        }

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Error::new(ErrorKind::RateLimited { retry_after }));
        }

        if matches!(status, 500 | 502 | 503 | 504) {
            // SOAP faults arrive as 500 and carry the real error in the body.
            let is_soap = request.header_value("SOAPAction").is_some();
            if !is_soap {
                return Err(Error::new(ErrorKind::Http {
                    status,
                    message: format!("Server error: {}", status),
                }));
            }
        }

        Ok(Response::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_retry_client() -> SfHttpClient {
        SfHttpClient::new(ClientConfig::builder().without_retry().build()).unwrap()
    }

    #[test]
    fn test_header_replaces_same_name() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com")
            .header("Accept", "application/json")
            .header("accept", "text/csv");

        assert_eq!(req.header_value("Accept"), Some("text/csv"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_body_content_types() {
        let req = RequestBuilder::new(RequestMethod::Put, "https://example.com").csv("Name\nAcme");
        assert_eq!(req.header_value("Content-Type"), Some("text/csv"));

        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .soap("<env/>", "login");
        assert_eq!(req.header_value("SOAPAction"), Some("login"));
        assert_eq!(
            req.header_value("Content-Type"),
            Some("text/xml; charset=UTF-8")
        );
    }

    #[tokio::test]
    async fn test_bearer_token_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("Authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = no_retry_client();
        let response = client
            .execute(client.get(format!("{}/ping", server.uri())).bearer_auth("session-token"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_salesforce_error_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sobjects/Contact"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!([{
                "errorCode": "REQUIRED_FIELD_MISSING",
                "message": "Required fields are missing: [LastName]",
                "fields": ["LastName"]
            }])))
            .mount(&server)
            .await;

        let client = no_retry_client();
        let err = client
            .execute(client.post(format!("{}/sobjects/Contact", server.uri())))
            .await
            .unwrap_err();

        match err.kind {
            ErrorKind::SalesforceApi { error_code, fields, .. } => {
                assert_eq!(error_code, "REQUIRED_FIELD_MISSING");
                assert_eq!(fields, vec!["LastName".to_string()]);
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
            .mount(&server)
            .await;

        let client = no_retry_client();
        let err = client
            .execute(client.get(format!("{}/limited", server.uri())))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(move |_: &wiremock::Request| {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({}))
                }
            })
            .mount(&server)
            .await;

        let client = SfHttpClient::new(
            ClientConfig::builder()
                .with_retry(
                    RetryConfig::default()
                        .with_max_attempts(3)
                        .with_initial_delay(Duration::from_millis(5)),
                )
                .build(),
        )
        .unwrap();

        let response = client
            .execute(client.get(format!("{}/flaky", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
