//! # sf-ops-rest
//!
//! Record operations over the Salesforce REST API: describe, create,
//! update, upsert by external id, and paginated SOQL queries.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_ops_rest::SalesforceRestClient;
//!
//! let client = SalesforceRestClient::new("https://myorg.my.salesforce.com", session_id)?;
//!
//! let created = client
//!     .create("Contact", &serde_json::json!({"LastName": "Lovelace"}))
//!     .await?;
//!
//! client
//!     .upsert("Contact", "Ext_UID__c", "A-17", &serde_json::json!({"LastName": "Byron"}))
//!     .await?;
//!
//! let page: sf_ops_client::QueryResult<serde_json::Value> =
//!     client.query_all("SELECT Id FROM Contact").await?;
//! ```

mod client;
mod describe;
mod error;
mod sobject;

pub use client::SalesforceRestClient;
pub use describe::{
    ChildRelationship, DescribeSObjectResult, FieldDescribe, PicklistValue, RecordTypeInfo,
};
pub use error::{Error, ErrorKind, Result};
pub use sf_ops_client::QueryResult;
pub use sobject::{CreateResult, SalesforceError, UpdateResult, UpsertResult};
