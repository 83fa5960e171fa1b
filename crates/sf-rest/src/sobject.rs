//! Record save results.

use serde::{Deserialize, Serialize};

/// Result of `POST sobjects/{name}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateResult {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

/// Result of `PATCH sobjects/{name}/{id}`. The API answers 204 with no body,
/// so this is built locally from the id that was updated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateResult {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

/// Result of `PATCH sobjects/{name}/{field}/{value}`.
///
/// `id` is absent when the API updated an existing record and answered 204.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpsertResult {
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

/// Per-record error inside a save result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesforceError {
    pub status_code: String,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

pub(crate) fn join_messages(errors: &[SalesforceError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.status_code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
