//! Where combinators such as `map` and `each` read their items from.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::jsonpath;
use crate::state::State;

/// A function evaluated against the current state.
pub type StateFn<C, T> = Arc<dyn Fn(&State<C>) -> Result<T> + Send + Sync>;

/// A source of data items.
///
/// Strings convert to [`DataSource::Path`]; JSON values convert to
/// [`DataSource::Literal`].
pub enum DataSource<C> {
    /// JSONPath over `{data, references, configuration}`.
    Path(String),
    Literal(Value),
    Derived(StateFn<C, Value>),
}

impl<C> DataSource<C> {
    /// Items selected by a JSONPath expression.
    pub fn path(expression: impl Into<String>) -> Self {
        DataSource::Path(expression.into())
    }

    /// Items computed from the state.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&State<C>) -> Result<Value> + Send + Sync + 'static,
    {
        DataSource::Derived(Arc::new(f))
    }

    /// Evaluate to a single JSON value. A path yields the array of its matches.
    pub fn resolve(&self, state: &State<C>) -> Result<Value> {
        match self {
            DataSource::Path(expression) => {
                Ok(Value::Array(jsonpath::select(expression, &state.to_json())?))
            }
            DataSource::Literal(value) => Ok(value.clone()),
            DataSource::Derived(f) => f(state),
        }
    }

    /// Evaluate to a list of items: an array gives its elements, `null` gives
    /// nothing, anything else is a single item.
    pub fn items(&self, state: &State<C>) -> Result<Vec<Value>> {
        Ok(match self.resolve(state)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }
}

impl<C> Clone for DataSource<C> {
    fn clone(&self) -> Self {
        match self {
            DataSource::Path(p) => DataSource::Path(p.clone()),
            DataSource::Literal(v) => DataSource::Literal(v.clone()),
            DataSource::Derived(f) => DataSource::Derived(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for DataSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            DataSource::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DataSource::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl<C> From<&str> for DataSource<C> {
    fn from(expression: &str) -> Self {
        DataSource::Path(expression.to_string())
    }
}

impl<C> From<String> for DataSource<C> {
    fn from(expression: String) -> Self {
        DataSource::Path(expression)
    }
}

impl<C> From<Value> for DataSource<C> {
    fn from(value: Value) -> Self {
        DataSource::Literal(value)
    }
}

impl<C> From<Vec<Value>> for DataSource<C> {
    fn from(items: Vec<Value>) -> Self {
        DataSource::Literal(Value::Array(items))
    }
}
