//! # sf-ops-client
//!
//! HTTP transport shared by the `sf-ops` Salesforce crates.
//!
//! This crate provides:
//! - A reqwest-backed HTTP client that retries throttled and transient responses
//! - Decoding of Salesforce error payloads into a typed [`ErrorKind`]
//! - A session-bound [`SalesforceClient`] that builds REST, Bulk and SOAP URLs
//!   and attaches the session token to every request
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          sf-ops-rest / sf-ops-bulk / sf-ops-auth            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - instance URL + session token + API version               │
//! │  - typed JSON helpers (get_json, post_json, patch_json)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - retry with backoff, 429 Retry-After handling             │
//! │  - Salesforce error decoding                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_ops_client::SalesforceClient;
//!
//! let client = SalesforceClient::new("https://na1.salesforce.com", "00D...!AQ...")?;
//! let limits: serde_json::Value = client.rest_get("limits").await?;
//! ```

mod config;
mod error;
mod http;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use http::{RequestBuilder, RequestMethod, SfHttpClient};
pub use response::Response;
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};
pub use salesforce_client::{QueryResult, SalesforceClient};

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client.
pub const USER_AGENT: &str = concat!("sf-ops/", env!("CARGO_PKG_VERSION"));
