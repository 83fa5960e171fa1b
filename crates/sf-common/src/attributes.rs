//! Record attributes whose values may depend on the state.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::data_source::StateFn;
use crate::error::{Error, ErrorKind, Result};
use crate::jsonpath::JsonPath;
use crate::state::State;

/// One attribute value.
pub enum Attr<C> {
    Value(Value),
    /// Evaluated against the state right before the remote call. `None`
    /// leaves the attribute out of the payload.
    Deferred(StateFn<C, Option<Value>>),
    /// Named but without a value; never sent.
    Unset,
}

impl<C: 'static> Attr<C> {
    /// Computed from the state at call time.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&State<C>) -> Result<Value> + Send + Sync + 'static,
    {
        Attr::Deferred(Arc::new(move |state| f(state).map(Some)))
    }

    /// Computed at call time; `None` omits the key.
    pub fn from_optional_fn<F>(f: F) -> Self
    where
        F: Fn(&State<C>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Attr::Deferred(Arc::new(f))
    }

    /// The first match of `expression` at call time; omitted when nothing
    /// matches.
    pub fn source_value(expression: &str) -> Result<Self> {
        let path = JsonPath::compile(expression)?;
        Ok(Attr::from_optional_fn(move |state| {
            Ok(path.first(&state.to_json()).cloned())
        }))
    }

    /// `references[position].id` at call time.
    pub fn reference(position: usize) -> Self {
        Attr::from_fn(move |state| reference(position, state))
    }
}

impl<C> Attr<C> {
    /// The value for `state`, or `None` when the key is omitted.
    pub fn resolve(&self, state: &State<C>) -> Result<Option<Value>> {
        match self {
            Attr::Value(v) => Ok(Some(v.clone())),
            Attr::Deferred(f) => f(state),
            Attr::Unset => Ok(None),
        }
    }
}

impl<C> Clone for Attr<C> {
    fn clone(&self) -> Self {
        match self {
            Attr::Value(v) => Attr::Value(v.clone()),
            Attr::Deferred(f) => Attr::Deferred(Arc::clone(f)),
            Attr::Unset => Attr::Unset,
        }
    }
}

impl<C> fmt::Debug for Attr<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Attr::Deferred(_) => f.write_str("Deferred(..)"),
            Attr::Unset => f.write_str("Unset"),
        }
    }
}

macro_rules! attr_from_literal {
    ($($t:ty),*) => {
        $(
            impl<C> From<$t> for Attr<C> {
                fn from(value: $t) -> Self {
                    Attr::Value(Value::from(value))
                }
            }
        )*
    };
}

attr_from_literal!(Value, &str, String, bool, i32, i64, u32, u64, f64);

/// `references[position].id`, or `null` when that result has no `id`.
pub fn reference<C>(position: usize, state: &State<C>) -> Result<Value> {
    let result = state.references.get(position).ok_or_else(|| {
        Error::new(ErrorKind::Reference {
            position,
            len: state.references.len(),
        })
    })?;
    Ok(result.get("id").cloned().unwrap_or(Value::Null))
}

/// A named attribute.
pub struct Field<C> {
    pub key: String,
    pub value: Attr<C>,
}

impl<C> Clone for Field<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl<C> fmt::Debug for Field<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

impl<C> From<&str> for Field<C> {
    fn from(key: &str) -> Self {
        Field {
            key: key.to_string(),
            value: Attr::Unset,
        }
    }
}

impl<C> From<String> for Field<C> {
    fn from(key: String) -> Self {
        Field {
            key,
            value: Attr::Unset,
        }
    }
}

/// A key with a value.
pub fn field<C>(key: impl Into<String>, value: impl Into<Attr<C>>) -> Field<C> {
    Field {
        key: key.into(),
        value: value.into(),
    }
}

/// Build an attribute mapping. Bare names become [`Attr::Unset`].
///
/// ```rust,ignore
/// let attrs = fields([field("LastName", "Lovelace"), "Email".into()]);
/// ```
pub fn fields<C, I, F>(entries: I) -> Attributes<C>
where
    I: IntoIterator<Item = F>,
    F: Into<Field<C>>,
{
    entries.into_iter().map(Into::into).collect()
}

/// An ordered attribute mapping. Inserting an existing key replaces its value
/// in place.
pub struct Attributes<C> {
    entries: Vec<(String, Attr<C>)>,
}

impl<C> Attributes<C> {
    /// An empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `key`, keeping its first position.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Attr<C>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` in place, keeping its first position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Attr<C>>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The attribute for `key`.
    pub fn get(&self, key: &str) -> Option<&Attr<C>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Literal attributes from a JSON object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().map(|(k, v)| field(k, v)).collect()),
            other => Err(Error::new(ErrorKind::Attribute(format!(
                "attributes must be a JSON object, got {other}"
            )))),
        }
    }
}

impl<C> Default for Attributes<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Attributes<C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C> fmt::Debug for Attributes<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<C> FromIterator<Field<C>> for Attributes<C> {
    fn from_iter<I: IntoIterator<Item = Field<C>>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for Field { key, value } in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl<C> Extend<Field<C>> for Attributes<C> {
    fn extend<I: IntoIterator<Item = Field<C>>>(&mut self, iter: I) {
        for Field { key, value } in iter {
            self.insert(key, value);
        }
    }
}

/// Resolve every attribute against `state`.
///
/// Literal values pass through, deferred values are each invoked once, and
/// unset attributes are left out.
pub fn expand_references<C>(state: &State<C>, attrs: &Attributes<C>) -> Result<Map<String, Value>> {
    let mut expanded = Map::new();
    for (key, attr) in &attrs.entries {
        if let Some(value) = attr.resolve(state)? {
            expanded.insert(key.clone(), value);
        }
    }
    Ok(expanded)
}
