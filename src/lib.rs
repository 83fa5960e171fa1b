//! # sf-ops
//!
//! Composable Salesforce operations over a threaded job state.
//!
//! A job is an ordered list of operations. Each one receives the state
//! produced by the one before, may make a single remote call, and records the
//! raw result at the front of `references` for later steps to read.
//!
//! ## Crates
//!
//! - **sf-ops-client** - HTTP client with retry, compression and Salesforce error decoding
//! - **sf-ops-auth** - Credentials and SOAP username/password login
//! - **sf-ops-rest** - REST API: CRUD, upsert, query and describe
//! - **sf-ops-bulk** - Bulk API 2.0 ingest jobs
//! - **sf-ops-common** - Job state, JSONPath, attributes and combinators
//! - **sf-ops-adaptor** - The Salesforce operations and `execute`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sf_ops::adaptor::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let job = execute(steps![
//!         create("Contact", Attributes::new()
//!             .with("FirstName", Attr::source_value("$.data.firstName")?)
//!             .with("LastName", "Lovelace")),
//!         query("SELECT Id, Name FROM Contact LIMIT 5"),
//!     ]);
//!
//!     let output = job.run_json(json!({
//!         "configuration": {
//!             "loginUrl": "https://login.salesforce.com",
//!             "username": "ada@example.com",
//!             "password": "...",
//!             "securityToken": "..."
//!         },
//!         "data": {"firstName": "Ada"}
//!     })).await?;
//!
//!     println!("{}", output["references"]);
//!     Ok(())
//! }
//! ```

pub use sf_ops_adaptor as adaptor;
pub use sf_ops_auth as auth;
pub use sf_ops_bulk as bulk;
pub use sf_ops_client as client;
pub use sf_ops_common as common;
pub use sf_ops_rest as rest;

pub use sf_ops_adaptor::{execute, Connection, FakeAdaptor, SalesforceConnection, SalesforceState};
pub use sf_ops_client::{ClientConfig, SalesforceClient};
pub use sf_ops_common::{Attributes, Error, ErrorKind, Operation, State};
