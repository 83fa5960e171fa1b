//! The job state threaded through every operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Result};

/// Results of prior operations, most recent first.
///
/// The list only grows at the front and [`prepend`](Self::prepend) consumes
/// the old list, so an operation cannot rewrite what an earlier one recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct References(Vec<Value>);

impl References {
    /// An empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Put `result` at position 0, shifting earlier results back.
    #[must_use]
    pub fn prepend(mut self, result: Value) -> Self {
        self.0.insert(0, result);
        self
    }

    /// The result at `position`, 0 being the most recent.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.0.get(position)
    }

    /// The most recently recorded result.
    pub fn latest(&self) -> Option<&Value> {
        self.0.first()
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Results from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Results as a slice, most recent first.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for References {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Per-execution logging handle.
///
/// Every event carries the execution id, so interleaved runs in one process
/// can be told apart.
#[derive(Debug, Clone)]
pub struct Logger {
    execution_id: Uuid,
}

impl Logger {
    /// A logger with a fresh execution id.
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
        }
    }

    /// Id attached to every event of this execution.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Log at info level.
    pub fn info(&self, message: impl AsRef<str>) {
        tracing::info!(execution_id = %self.execution_id, "{}", message.as_ref());
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl AsRef<str>) {
        tracing::debug!(execution_id = %self.execution_id, "{}", message.as_ref());
    }

    /// Log at error level.
    pub fn error(&self, message: impl AsRef<str>) {
        tracing::error!(execution_id = %self.execution_id, "{}", message.as_ref());
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_configuration() -> Value {
    Value::Object(Map::new())
}

/// Job state: input data, recorded results, configuration and the transient
/// session handle `C`.
///
/// Only `data`, `references` and `configuration` are serialized. The session
/// and logger never leave the process.
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct State<C> {
    /// Current input data.
    #[serde(default)]
    pub data: Value,
    /// Results recorded by earlier operations.
    #[serde(default)]
    pub references: References,
    /// Credentials and connection settings.
    #[serde(default = "empty_configuration")]
    pub configuration: Value,
    /// Session handle, present between bootstrap and teardown.
    #[serde(skip)]
    pub connection: Option<C>,
    /// Logging handle for this execution.
    #[serde(skip)]
    pub logger: Logger,
}

impl<C> Default for State<C> {
    fn default() -> Self {
        Self {
            data: Value::Null,
            references: References::new(),
            configuration: empty_configuration(),
            connection: None,
            logger: Logger::new(),
        }
    }
}

impl<C> State<C> {
    /// A state with no references and no session.
    pub fn new(configuration: Value, data: Value) -> Self {
        Self {
            configuration,
            data,
            ..Self::default()
        }
    }

    /// Parse `{configuration, data, references?}` as supplied by a job runner.
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::config("initial state must be a JSON object"));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))
    }

    /// The externally visible view: `{data, references, configuration}`.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("data".to_string(), self.data.clone());
        object.insert(
            "references".to_string(),
            Value::Array(self.references.as_slice().to_vec()),
        );
        object.insert("configuration".to_string(), self.configuration.clone());
        Value::Object(object)
    }

    /// Replace `data`.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Record an operation result at the front of `references`.
    #[must_use]
    pub fn push_reference(mut self, result: Value) -> Self {
        self.references = self.references.prepend(result);
        self
    }

    /// Attach a session handle.
    #[must_use]
    pub fn with_connection(mut self, connection: C) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Drop the session handle.
    #[must_use]
    pub fn without_connection(mut self) -> Self {
        self.connection = None;
        self
    }

    /// The session handle, or a connection error if bootstrap has not run.
    pub fn connection(&self) -> Result<&C> {
        self.connection.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Connection(
                "no connection on state; run create_connection first".to_string(),
            ))
        })
    }

    /// A string value from `configuration`.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).and_then(Value::as_str)
    }
}

impl<C: Clone> State<C> {
    /// A copy of this state scoped to one data item.
    pub fn scoped(&self, data: Value) -> Self {
        Self {
            data,
            references: self.references.clone(),
            configuration: self.configuration.clone(),
            connection: self.connection.clone(),
            logger: self.logger.clone(),
        }
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("password") || key.contains("token") || key.contains("secret")
}

fn redact(configuration: &Value) -> Value {
    match configuration {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_secret_key(k) {
                        Value::from("[REDACTED]")
                    } else {
                        v.clone()
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("data", &self.data)
            .field("references", &self.references)
            .field("configuration", &redact(&self.configuration))
            .field("connection", &self.connection.as_ref().map(|_| "<session>"))
            .field("execution_id", &self.logger.execution_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type TestState = State<()>;

    #[test]
    fn test_prepend_is_most_recent_first() {
        let refs = References::new()
            .prepend(json!({"id": "a"}))
            .prepend(json!({"id": "b"}));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.latest(), Some(&json!({"id": "b"})));
        assert_eq!(refs.get(1), Some(&json!({"id": "a"})));
    }

    #[test]
    fn test_serialization_omits_connection() {
        let state = TestState::new(json!({"loginUrl": "https://x"}), json!({"a": 1}))
            .with_connection(());
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(
            value,
            json!({"data": {"a": 1}, "references": [], "configuration": {"loginUrl": "https://x"}})
        );
        assert_eq!(value, state.to_json());
    }

    #[test]
    fn test_from_json_defaults() {
        let state = TestState::from_json(json!({"data": {"firstName": "A"}})).unwrap();
        assert_eq!(state.configuration, json!({}));
        assert!(state.references.is_empty());
        assert!(state.connection.is_none());

        assert!(TestState::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_missing_connection_is_error() {
        let err = TestState::default().connection().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Connection(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let state = TestState::new(
            json!({"username": "ada@example.com", "password": "hunter2", "securityToken": "tok"}),
            Value::Null,
        );
        let debug = format!("{:?}", state);
        assert!(debug.contains("ada@example.com"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("\"tok\""));
    }

    #[test]
    fn test_scoped_keeps_references() {
        let state = TestState::default().push_reference(json!({"id": "1"}));
        let scoped = state.scoped(json!({"n": 2}));
        assert_eq!(scoped.data, json!({"n": 2}));
        assert_eq!(scoped.references, state.references);
        assert_eq!(scoped.logger.execution_id(), state.logger.execution_id());
    }
}
