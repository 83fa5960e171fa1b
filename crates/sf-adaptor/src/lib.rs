//! # sf-ops-adaptor
//!
//! Salesforce operations over a threaded job [`State`].
//!
//! Every operation takes the state, makes at most one call through the
//! attached session and records the raw result at the front of
//! `references`. [`execute`] wraps a list of operations with session
//! bootstrap and teardown:
//!
//! ```rust,ignore
//! use sf_ops_adaptor::*;
//!
//! let job = execute(steps![
//!     create("Account", Attributes::new().with("Name", "Acme")),
//!     create("Contact", Attributes::new()
//!         .with("LastName", Attr::source_value("$.data.lastName")?)
//!         .with("AccountId", Attr::reference(0))),
//!     bulk("Contact", BulkOperation::Insert, BulkOptions::new(), "$.data.contacts[*]"),
//! ]);
//!
//! let output = job.run_json(input).await?;
//! ```
//!
//! The session is a [`Connection`] trait object. [`SalesforceConnection`]
//! talks to an org over SOAP login, REST and Bulk API 2.0;
//! [`FakeConnection`] answers from memory for tests and dry runs.

mod bootstrap;
mod bulk;
mod configuration;
mod connection;
mod fake;
mod operations;
mod salesforce;

pub use bootstrap::{
    cleanup_state, create_connection, execute, login, CleanupState, Connector, CreateConnection,
    Execute, Login,
};
pub use bulk::{bulk, Bulk, BulkOptions};
pub use configuration::Configuration;
pub use connection::{BulkSettings, Connection, Record, SalesforceState, Session};
pub use fake::{Call, FakeAdaptor, FakeConnection, FakeCreate};
pub use operations::{
    create, create_if, describe, query, update, upsert, upsert_if, Create, Describe, Query,
    Update, Upsert,
};
pub use salesforce::SalesforceConnection;

pub use sf_ops_bulk::{BulkOperation, BulkRowResult};
pub use sf_ops_common::{
    alter_state, array_to_string, combine, data_path, data_value, each, expand_references, field,
    fields, join, last_reference_value, map, merge, operation, reference, reference_path,
    relationship, source, source_value, steps, to_array, Attr, Attributes, BoxedOperation,
    DataSource, Error, ErrorKind, Field, Operation, References, Result, State,
};
