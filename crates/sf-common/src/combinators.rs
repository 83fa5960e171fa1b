//! Combinators for selecting data and composing operations.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::attributes::{expand_references, Attr, Attributes, Field};
use crate::data_source::DataSource;
use crate::error::Result;
use crate::jsonpath::{self, JsonPath};
use crate::operation::{BoxedOperation, Operation};
use crate::state::State;

/// Every match of `expression` against `{data, references, configuration}`.
pub fn source<C>(expression: &str, state: &State<C>) -> Result<Vec<Value>> {
    jsonpath::select(expression, &state.to_json())
}

/// The first match of `expression`, if any.
pub fn source_value<C>(expression: &str, state: &State<C>) -> Result<Option<Value>> {
    Ok(JsonPath::compile(expression)?
        .first(&state.to_json())
        .cloned())
}

/// See [`map`].
pub struct MapOperation<C, O> {
    source: DataSource<C>,
    operation: O,
}

/// Run `operation` once per item, each against the outer state with `data`
/// set to that item.
///
/// Results are discarded and the outer state is returned as it came in. Items
/// run one after another; the first error fails the whole step.
pub fn map<C, O>(source: impl Into<DataSource<C>>, operation: O) -> MapOperation<C, O> {
    MapOperation {
        source: source.into(),
        operation,
    }
}

#[async_trait]
impl<C, O> Operation<C> for MapOperation<C, O>
where
    C: Clone + Send + Sync + 'static,
    O: Operation<C>,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        let items = self.source.items(&state)?;
        state.logger.debug(format!("map over {} item(s)", items.len()));
        for item in items {
            self.operation.apply(state.scoped(item)).await?;
        }
        Ok(state)
    }
}

/// See [`each`].
pub struct EachOperation<C, O> {
    source: DataSource<C>,
    operation: O,
}

/// Fold `operation` over the items: each call sees the state left by the
/// previous one, with `data` set to its item.
///
/// The state left by the last call is the result, `data` included.
pub fn each<C, O>(source: impl Into<DataSource<C>>, operation: O) -> EachOperation<C, O> {
    EachOperation {
        source: source.into(),
        operation,
    }
}

#[async_trait]
impl<C, O> Operation<C> for EachOperation<C, O>
where
    C: Send + Sync + 'static,
    O: Operation<C>,
{
    async fn apply(&self, mut state: State<C>) -> Result<State<C>> {
        let items = self.source.items(&state)?;
        for item in items {
            state = self.operation.apply(state.with_data(item)).await?;
        }
        Ok(state)
    }
}

/// See [`combine`].
pub struct Combine<C> {
    operations: Vec<BoxedOperation<C>>,
}

/// Left-to-right composition of `operations` into one.
pub fn combine<C>(operations: Vec<BoxedOperation<C>>) -> Combine<C> {
    Combine { operations }
}

#[async_trait]
impl<C> Operation<C> for Combine<C>
where
    C: Send + Sync + 'static,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        self.operations.apply(state).await
    }
}

/// Items at `target_path`, each given `target_key` set to the first match of
/// `source_path`. A key already present on an item is left alone.
pub fn join<C: 'static>(target_path: &str, source_path: &str, target_key: &str) -> Result<DataSource<C>> {
    let target = JsonPath::compile(target_path)?;
    let source = JsonPath::compile(source_path)?;
    let key = target_key.to_string();

    Ok(DataSource::derived(move |state| {
        let root = state.to_json();
        let value = source.first(&root).cloned().unwrap_or(Value::Null);

        let joined = target
            .select(&root)
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => {
                    let mut merged = Map::new();
                    merged.insert(key.clone(), value.clone());
                    for (k, v) in fields {
                        merged.insert(k.clone(), v.clone());
                    }
                    Value::Object(merged)
                }
                other => other.clone(),
            })
            .collect();
        Ok(Value::Array(joined))
    }))
}

/// Each item from `source` with the expanded `fields` laid over it.
pub fn merge<C: 'static>(source: impl Into<DataSource<C>>, fields: Attributes<C>) -> DataSource<C> {
    let source = source.into();
    DataSource::derived(move |state| {
        let overlay = expand_references(state, &fields)?;
        let merged = source
            .items(state)?
            .into_iter()
            .map(|item| {
                let mut object = match item {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                object.extend(overlay.clone());
                Value::Object(object)
            })
            .collect();
        Ok(Value::Array(merged))
    })
}

/// `$.data.<path>`
pub fn data_path(path: &str) -> String {
    format!("$.data.{}", path)
}

/// The first match under `data`, read when the attribute is expanded.
pub fn data_value<C: 'static>(path: &str) -> Result<Attr<C>> {
    Attr::source_value(&data_path(path))
}

/// `$.references<path>`, e.g. `reference_path("[0].id")`.
pub fn reference_path(path: &str) -> String {
    format!("$.references{}", path)
}

/// A field of the most recent reference, read when the attribute is expanded.
pub fn last_reference_value<C: 'static>(path: &str) -> Result<Attr<C>> {
    Attr::source_value(&format!("$.references[0].{}", path))
}

/// Wrap a scalar in a list; lists pass through.
pub fn to_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Join values with `separator`. Strings are used as-is, other values in
/// their JSON form.
pub fn array_to_string(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// A lookup by external id: `{name: {external_id_field: value}}`.
///
/// ```rust,ignore
/// relationship("Account__r", "Ext_UID__c", data_value("accountId")?)
/// ```
pub fn relationship<C: 'static>(
    name: &str,
    external_id_field: &str,
    value: impl Into<Attr<C>>,
) -> Field<C> {
    let value = value.into();
    let external_id_field = external_id_field.to_string();
    Field {
        key: name.to_string(),
        value: Attr::from_optional_fn(move |state| {
            Ok(value.resolve(state)?.map(|v| {
                let mut lookup = Map::new();
                lookup.insert(external_id_field.clone(), v);
                Value::Object(lookup)
            }))
        }),
    }
}
