//! HTTP response wrapper with Salesforce error decoding.

use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// A received HTTP response.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// `Sforce-Locator` header, used to page Bulk API result sets.
    pub fn sforce_locator(&self) -> Option<&str> {
        self.header("sforce-locator").filter(|l| *l != "null")
    }

    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }

    /// Pass 2xx responses through; turn anything else into a typed error.
    pub async fn error_for_status(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status();
        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body))
    }
}

/// Salesforce REST error payload.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}

impl From<SalesforceErrorResponse> for ErrorKind {
    fn from(err: SalesforceErrorResponse) -> Self {
        ErrorKind::SalesforceApi {
            error_code: err.error_code,
            message: sanitize_error_message(&err.message),
            fields: err.fields.unwrap_or_default(),
        }
    }
}

fn parse_error_response(status: u16, body: &str) -> Error {
    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return Error::new(err.into());
        }
    }
    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return Error::new(err.into());
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };
    Error::new(kind)
}

/// Strip session tokens from a message and cap its length.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    // Session tokens are the org id, a `!`, then the opaque part.
    if let Ok(token) = regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}![A-Za-z0-9_.]+") {
        sanitized = token.replace_all(&sanitized, "[REDACTED_TOKEN]").to_string();
    }
    if let Ok(sid) = regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}") {
        sanitized = sid.replace_all(&sanitized, "sid=[REDACTED]").to_string();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
