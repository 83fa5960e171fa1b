//! # sf-ops-auth
//!
//! Session bootstrap for Salesforce orgs.
//!
//! Jobs authenticate with a username, a password and an optional security
//! token. [`SoapLogin`] posts these to the SOAP partner `login` endpoint and
//! returns [`SalesforceCredentials`] holding the session id and the instance
//! URL the org lives on.
//!
//! Passwords, security tokens and session ids are redacted in Debug output
//! and skipped in tracing spans.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_ops_auth::{LoginConfig, SoapLogin};
//! use sf_ops_client::ClientConfig;
//!
//! let config = LoginConfig::from_env()?;
//! let creds = SoapLogin::with_config(ClientConfig::default())?.login(&config).await?;
//! let client = creds.client_with_config(ClientConfig::default())?;
//! ```

mod credentials;
mod error;
mod login;

pub use credentials::{Credentials, LoginConfig, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use login::SoapLogin;

/// Production login host.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Sandbox login host.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
