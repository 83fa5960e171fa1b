//! Username/password login through the SOAP partner API.
//!
//! `POST {login_url}/services/Soap/u/{version}` with a `login` envelope. The
//! response carries `sessionId` and `serverUrl`; the instance URL is the
//! origin of `serverUrl`.

use sf_ops_client::security::xml;
use sf_ops_client::{ClientConfig, SfHttpClient};
use tracing::{debug, info, instrument};

use crate::credentials::{Credentials, LoginConfig, SalesforceCredentials};
use crate::error::{Error, ErrorKind, Result};

/// Performs SOAP `login` calls.
#[derive(Debug, Clone)]
pub struct SoapLogin {
    http: SfHttpClient,
}

impl SoapLogin {
    /// Log in over `http`.
    pub fn new(http: SfHttpClient) -> Self {
        Self { http }
    }

    /// Log in over a new transport built from `config`.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(SfHttpClient::new(config)?))
    }

    /// The transport used for login.
    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    /// Exchange username and password (plus security token) for a session.
    #[instrument(skip(self, config), fields(username = %config.username, login_url = %config.login_url))]
    pub async fn login(&self, config: &LoginConfig) -> Result<SalesforceCredentials> {
        config.validate()?;

        let endpoint = format!(
            "{}/services/Soap/u/{}",
            config.login_url, config.api_version
        );
        let envelope = login_envelope(&config.username, &config.login_password());

        let response = self
            .http
            .execute_raw(self.http.post(endpoint).soap(envelope, "login"))
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if let Some((code, message)) = parse_soap_fault(&body) {
            return Err(Error::new(ErrorKind::LoginFault { code, message }));
        }
        if !(200..300).contains(&status) {
            return Err(Error::new(ErrorKind::Http(format!(
                "login endpoint returned HTTP {}",
                status
            ))));
        }

        let credentials = parse_login_response(&body, &config.api_version)?;
        info!(instance_url = credentials.instance_url(), "Login succeeded");
        Ok(credentials)
    }
}

fn login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        xml::escape(username),
        xml::escape(password)
    )
}

fn parse_login_response(body: &str, api_version: &str) -> Result<SalesforceCredentials> {
    let session_id = extract_element(body, "sessionId")
        .ok_or_else(|| Error::new(ErrorKind::InvalidResponse("missing sessionId".to_string())))?;
    let server_url = extract_element(body, "serverUrl")
        .ok_or_else(|| Error::new(ErrorKind::InvalidResponse("missing serverUrl".to_string())))?;

    if extract_element(body, "passwordExpired").as_deref() == Some("true") {
        return Err(Error::new(ErrorKind::InvalidCredentials(
            "password expired".to_string(),
        )));
    }

    let server_url = url::Url::parse(&xml::unescape(&server_url))?;
    let instance_url = server_url.origin().ascii_serialization();
    debug!(server_url = %server_url, "Parsed login response");

    Ok(
        SalesforceCredentials::new(instance_url, xml::unescape(&session_id), api_version)
            .with_identity(
                extract_element(body, "userId"),
                extract_element(body, "organizationId"),
            ),
    )
}

/// `(code, message)` of a SOAP fault, with the `sf:` prefix dropped from the code.
fn parse_soap_fault(body: &str) -> Option<(String, String)> {
    let code = extract_element(body, "faultcode")?;
    let code = code.rsplit(':').next().unwrap_or(&code).to_string();
    let message = extract_element(body, "faultstring")
        .map(|s| xml::unescape(&s))
        .unwrap_or_else(|| "Unknown error".to_string());
    Some((code, message))
}

/// Text content of the first element whose local name is `tag`, whatever
/// its namespace prefix.
fn extract_element(body: &str, tag: &str) -> Option<String> {
    let mut from = 0;
    while let Some(offset) = body[from..].find('<') {
        let start = from + offset + 1;
        let rest = &body[start..];
        let name_end = rest.find(|c: char| c == '>' || c.is_whitespace())?;
        let name = &rest[..name_end];
        let local = name.rsplit(':').next().unwrap_or(name);

        if local == tag && !name.starts_with('/') {
            let content_start = start + rest.find('>')? + 1;
            let close = format!("</{}>", name);
            let content_len = body[content_start..].find(&close)?;
            return Some(body[content_start..content_start + content_len].to_string());
        }
        from = start;
    }
    None
}
