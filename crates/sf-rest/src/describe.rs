//! sObject describe metadata.
//!
//! Only the parts jobs look at are typed; everything else in the payload is
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Result of `GET sobjects/{name}/describe`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    pub label_plural: Option<String>,
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,

    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub queryable: bool,

    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
    #[serde(default)]
    pub child_relationships: Vec<ChildRelationship>,
    #[serde(default)]
    pub record_type_infos: Vec<RecordTypeInfo>,
}

impl DescribeSObjectResult {
    /// The field named `name`, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Fields usable as the match key of an upsert.
    pub fn external_id_fields(&self) -> impl Iterator<Item = &FieldDescribe> {
        self.fields.iter().filter(|f| f.external_id || (f.id_lookup && f.name != "Id"))
    }

    /// Fields that must be supplied on create: not nillable, not defaulted.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescribe> {
        self.fields
            .iter()
            .filter(|f| f.createable && !f.nillable && !f.defaulted_on_create.unwrap_or(false))
    }
}

/// One field of an sObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub length: Option<i32>,

    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub external_id: bool,
    #[serde(default)]
    pub id_lookup: bool,
    pub defaulted_on_create: Option<bool>,

    /// Target sObjects of a lookup or master-detail field.
    #[serde(default)]
    pub reference_to: Vec<String>,
    /// Relationship name used in nested upsert payloads (`Account__r`).
    pub relationship_name: Option<String>,

    #[serde(default)]
    pub picklist_values: Vec<PicklistValue>,
}

/// A relationship from a child sObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    pub relationship_name: Option<String>,
}

/// A record type available on the sObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTypeInfo {
    pub name: String,
    pub record_type_id: String,
    pub developer_name: Option<String>,
    pub active: bool,
    #[serde(rename = "defaultRecordTypeMapping")]
    pub is_default: bool,
}

/// One entry of a picklist field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistValue {
    pub value: String,
    pub label: Option<String>,
    pub active: bool,
    pub default_value: bool,
}
