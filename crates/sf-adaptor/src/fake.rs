//! In-memory stand-ins for running jobs without an org.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use sf_ops_bulk::{BulkOperation, BulkRowResult};
use sf_ops_common::{
    expand_references, Attributes, BoxedOperation, Error, ErrorKind, Operation, Result, State,
};
use sf_ops_rest::DescribeSObjectResult;

use crate::connection::{BulkSettings, Connection, Record};

/// One call made against a [`FakeConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Connection method name, e.g. `"create"`.
    pub method: &'static str,
    /// Target sObject, when the method takes one.
    pub sobject: Option<String>,
    /// What was sent, as JSON.
    pub payload: Value,
}

/// A [`Connection`] that answers from memory and records every call.
///
/// Creates and upserts get sequential synthetic ids. Query and bulk answers
/// can be preset; a method can be made to fail with [`fail_on`](Self::fail_on).
#[derive(Debug, Default)]
pub struct FakeConnection {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    query_records: Vec<Value>,
    bulk_results: Option<Vec<BulkRowResult>>,
    failing: Option<(&'static str, String)>,
}

impl FakeConnection {
    /// A connection with no preset answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every query with `records`.
    pub fn with_query_records(mut self, records: Vec<Value>) -> Self {
        self.query_records = records;
        self
    }

    /// Answer every bulk call with `results` instead of one success per row.
    pub fn with_bulk_results(mut self, results: Vec<BulkRowResult>) -> Self {
        self.bulk_results = Some(results);
        self
    }

    /// Make calls to `method` (`"create"`, `"query"`, ...) fail with `message`.
    pub fn fail_on(mut self, method: &'static str, message: impl Into<String>) -> Self {
        self.failing = Some((method, message.into()));
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, method: &'static str, sobject: Option<&str>, payload: Value) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                method,
                sobject: sobject.map(str::to_string),
                payload,
            });
        }
        match &self.failing {
            Some((failing, message)) if *failing == method => {
                Err(Error::new(ErrorKind::Remote(message.clone())))
            }
            _ => Ok(()),
        }
    }

    fn next_id(&self, sobject: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix: String = sobject.chars().take(3).collect();
        format!("{}FAKE{:08}", prefix, n)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn login(&self, username: &str, _password: &str) -> Result<()> {
        self.record("login", None, json!({ "username": username }))
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        self.record("describe", Some(sobject), Value::Null)?;
        Ok(DescribeSObjectResult {
            name: sobject.to_string(),
            label: sobject.to_string(),
            label_plural: None,
            key_prefix: None,
            custom: sobject.ends_with("__c"),
            createable: true,
            updateable: true,
            deletable: true,
            queryable: true,
            fields: Vec::new(),
            child_relationships: Vec::new(),
            record_type_infos: Vec::new(),
        })
    }

    async fn create(&self, sobject: &str, record: &Record) -> Result<Value> {
        self.record("create", Some(sobject), Value::Object(record.clone()))?;
        Ok(json!({ "id": self.next_id(sobject), "success": true, "errors": [] }))
    }

    async fn update(&self, sobject: &str, record: &Record) -> Result<Value> {
        self.record("update", Some(sobject), Value::Object(record.clone()))?;
        let id = record.get("Id").cloned().ok_or_else(|| {
            Error::new(ErrorKind::Attribute("missing required attribute Id".to_string()))
        })?;
        Ok(json!({ "id": id, "success": true, "errors": [] }))
    }

    async fn upsert(
        &self,
        sobject: &str,
        external_id_field: &str,
        record: &Record,
    ) -> Result<Value> {
        self.record(
            "upsert",
            Some(sobject),
            json!({ "externalIdField": external_id_field, "record": record }),
        )?;
        Ok(json!({
            "id": self.next_id(sobject),
            "success": true,
            "created": true,
            "errors": []
        }))
    }

    async fn query(&self, soql: &str) -> Result<Value> {
        self.record("query", None, Value::from(soql))?;
        Ok(json!({
            "totalSize": self.query_records.len(),
            "done": true,
            "records": self.query_records
        }))
    }

    async fn bulk(
        &self,
        sobject: &str,
        operation: BulkOperation,
        rows: &[Value],
        settings: &BulkSettings,
    ) -> Result<Vec<BulkRowResult>> {
        self.record(
            "bulk",
            Some(sobject),
            json!({
                "operation": operation.api_name(),
                "externalIdField": settings.external_id_field,
                "rows": rows
            }),
        )?;

        if let Some(results) = &self.bulk_results {
            return Ok(results.clone());
        }
        Ok(rows
            .iter()
            .map(|row| BulkRowResult {
                success: true,
                created: operation == BulkOperation::Insert,
                id: Some(self.next_id(sobject)),
                error: None,
                fields: row.as_object().cloned().unwrap_or_default(),
            })
            .collect())
    }
}

/// Runs jobs with no connection at all.
///
/// [`FakeAdaptor::create`] records `{sObject, fields, Id}` where `Id` is one
/// more than the number of references already recorded.
pub struct FakeAdaptor;

/// See [`FakeAdaptor::create`].
pub struct FakeCreate<C> {
    sobject: String,
    attrs: Attributes<C>,
}

#[async_trait]
impl<C> Operation<C> for FakeCreate<C>
where
    C: Send + Sync + 'static,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        state.logger.debug(format!("Creating {}", self.sobject));
        state.logger.debug(state.data.to_string());

        let fields = expand_references(&state, &self.attrs)?;
        let result = json!({
            "sObject": self.sobject,
            "fields": fields,
            "Id": state.references.len() + 1
        });
        Ok(state.push_reference(result))
    }
}

impl FakeAdaptor {
    /// Like [`create`](crate::operations::create), recording a synthetic result without a session.
    pub fn create<C>(sobject: impl Into<String>, attrs: Attributes<C>) -> FakeCreate<C> {
        FakeCreate {
            sobject: sobject.into(),
            attrs,
        }
    }

    /// Apply `operations` to `state`.
    ///
    /// Failures end here: they are logged and `None` is returned.
    pub async fn execute<C>(
        state: State<C>,
        operations: Vec<BoxedOperation<C>>,
    ) -> Option<State<C>>
    where
        C: Send + Sync + 'static,
    {
        let logger = state.logger.clone();
        match operations.apply(state).await {
            Ok(state) => {
                let references = Value::Array(state.references.as_slice().to_vec());
                match serde_json::to_string_pretty(&references) {
                    Ok(text) => state.logger.info(text),
                    Err(e) => state.logger.error(e.to_string()),
                }
                state.logger.info("Finished Successfully");
                Some(state)
            }
            Err(err) => {
                logger.error(format!("{err:?}"));
                logger.info("Job failed.");
                None
            }
        }
    }
}
