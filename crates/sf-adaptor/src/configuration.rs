//! Connection settings read from `state.configuration`.

use serde::Deserialize;
use serde_json::Value;

use sf_ops_common::{Error, ErrorKind, Result};

/// `{loginUrl, username, password, securityToken, apiVersion?}`
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    security_token: String,
    #[serde(default)]
    pub api_version: Option<String>,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Configuration {
    /// Read the `configuration` object of a state.
    pub fn from_json(configuration: &Value) -> Result<Self> {
        Configuration::deserialize(configuration)
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))
    }

    /// The login URL; a configuration error when missing or empty.
    pub fn login_url(&self) -> Result<&str> {
        match self.login_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(Error::config("loginUrl missing from configuration.")),
        }
    }

    /// Password with the security token appended.
    pub fn login_password(&self) -> String {
        format!("{}{}", self.password, self.security_token)
    }

    /// Configured API version, or the client default.
    pub fn api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .unwrap_or(sf_ops_client::DEFAULT_API_VERSION)
    }
}
