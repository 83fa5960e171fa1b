//! Session credentials.
//!
//! Both types here hold secrets and implement Debug by hand.

use sf_ops_client::{ClientConfig, SalesforceClient, SfHttpClient};

use crate::error::{Error, ErrorKind, Result};

/// Anything that can authenticate requests against an instance.
pub trait Credentials: Send + Sync {
    fn instance_url(&self) -> &str;

    fn session_token(&self) -> &str;

    fn api_version(&self) -> &str;

    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.session_token().is_empty()
    }
}

/// An established session, as returned by a successful login.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    session_token: String,
    api_version: String,
    user_id: Option<String>,
    organization_id: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("session_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("user_id", &self.user_id)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

impl SalesforceCredentials {
    /// Session credentials without user or org identity.
    pub fn new(
        instance_url: impl Into<String>,
        session_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            session_token: session_token.into(),
            api_version: api_version.into(),
            user_id: None,
            organization_id: None,
        }
    }

    /// Attach the user and org ids returned by login.
    pub fn with_identity(
        mut self,
        user_id: Option<String>,
        organization_id: Option<String>,
    ) -> Self {
        self.user_id = user_id;
        self.organization_id = organization_id;
        self
    }

    /// Logged in user id, when known.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Org id, when known.
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    /// Build a [`SalesforceClient`] bound to this session over `http`.
    pub fn client(&self, http: SfHttpClient) -> SalesforceClient {
        SalesforceClient::from_http(http, &self.instance_url, &self.session_token)
            .with_api_version(&self.api_version)
    }

    /// Build a [`SalesforceClient`] with its own transport.
    pub fn client_with_config(&self, config: ClientConfig) -> Result<SalesforceClient> {
        Ok(self.client(SfHttpClient::new(config)?))
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn session_token(&self) -> &str {
        &self.session_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

/// Username/password login settings.
///
/// The security token is appended to the password at login time, as the
/// SOAP `login` call expects for orgs that enforce IP restrictions.
#[derive(Clone)]
pub struct LoginConfig {
    pub login_url: String,
    pub username: String,
    password: String,
    security_token: Option<String>,
    pub api_version: String,
}

impl std::fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginConfig")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl LoginConfig {
    /// Login settings with no security token and the default API version.
    pub fn new(
        login_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            login_url: login_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            security_token: None,
            api_version: sf_ops_client::DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Token appended to the password; an empty token is ignored.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.security_token = (!token.is_empty()).then_some(token);
        self
    }

    /// API version used for the login request and the session.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Password with the security token appended, as sent on the wire.
    pub(crate) fn login_password(&self) -> String {
        match &self.security_token {
            Some(token) => format!("{}{}", self.password, token),
            None => self.password.clone(),
        }
    }

    /// Load settings from the environment.
    ///
    /// Required: `SF_LOGIN_URL`, `SF_USERNAME`, `SF_PASSWORD`.
    /// Optional: `SF_SECURITY_TOKEN`, `SF_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| Error::new(ErrorKind::EnvVar(name.to_string())))
        };

        let mut config = Self::new(var("SF_LOGIN_URL")?, var("SF_USERNAME")?, var("SF_PASSWORD")?);
        if let Ok(token) = std::env::var("SF_SECURITY_TOKEN") {
            config = config.with_security_token(token);
        }
        if let Ok(version) = std::env::var("SF_API_VERSION") {
            config = config.with_api_version(version);
        }
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.login_url.is_empty() {
            return Err(Error::new(ErrorKind::Config("loginUrl is empty".to_string())));
        }
        if self.username.is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "username is empty".to_string(),
            )));
        }
        url::Url::parse(&self.login_url)?;
        Ok(())
    }
}
