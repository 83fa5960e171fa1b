//! Session bootstrap and teardown, and the [`execute`] entry point.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use sf_ops_common::{BoxedOperation, Operation, Result, State};

use crate::configuration::Configuration;
use crate::connection::{SalesforceState, Session};
use crate::salesforce::SalesforceConnection;

/// Builds an unauthenticated session from configuration.
pub type Connector = Arc<dyn Fn(&Configuration) -> Result<Session> + Send + Sync>;

fn salesforce_connector() -> Connector {
    Arc::new(|config: &Configuration| -> Result<Session> {
        let connection = SalesforceConnection::new(config.login_url()?, config.api_version())?;
        Ok(Arc::new(connection) as Session)
    })
}

/// See [`create_connection`].
pub struct CreateConnection {
    connector: Connector,
}

/// Attach a new session for `configuration.loginUrl` to the state.
///
/// A missing `loginUrl` fails before anything is sent.
pub fn create_connection() -> CreateConnection {
    CreateConnection {
        connector: salesforce_connector(),
    }
}

impl CreateConnection {
    /// Use `connector` instead of connecting to Salesforce.
    pub fn with_connector(connector: Connector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl Operation<Session> for CreateConnection {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        let config = Configuration::from_json(&state.configuration)?;
        config.login_url()?;
        let session = (self.connector)(&config)?;
        Ok(state.with_connection(session))
    }
}

/// See [`login`].
pub struct Login;

/// Authenticate the attached session with
/// `configuration.{username, password, securityToken}`.
pub fn login() -> Login {
    Login
}

#[async_trait]
impl Operation<Session> for Login {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        let config = Configuration::from_json(&state.configuration)?;
        state
            .logger
            .info(format!("Logging in as {}.", config.username));
        state
            .connection()?
            .login(&config.username, &config.login_password())
            .await?;
        Ok(state)
    }
}

/// See [`cleanup_state`].
pub struct CleanupState;

/// Drop the session from the state.
pub fn cleanup_state() -> CleanupState {
    CleanupState
}

#[async_trait]
impl<C> Operation<C> for CleanupState
where
    C: Send + Sync + 'static,
{
    async fn apply(&self, state: State<C>) -> Result<State<C>> {
        Ok(state.without_connection())
    }
}

/// See [`execute`].
pub struct Execute {
    operations: Vec<BoxedOperation<Session>>,
    connector: Connector,
}

/// Run `operations` between bootstrap and teardown:
/// `create_connection`, `login`, the operations in order, `cleanup_state`.
///
/// The first error stops the chain and is returned as is; the session is
/// dropped with the state.
///
/// ```rust,ignore
/// let state = execute(steps![
///     create("Contact", Attributes::new().with("LastName", "Lovelace")),
///     query("SELECT Id FROM Contact"),
/// ])
/// .apply(State::from_json(input)?)
/// .await?;
/// ```
pub fn execute(operations: Vec<BoxedOperation<Session>>) -> Execute {
    Execute {
        operations,
        connector: salesforce_connector(),
    }
}

impl Execute {
    /// Use `connector` instead of connecting to Salesforce.
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    /// Run against an initial state in its JSON form, returning the final
    /// `{data, references, configuration}`.
    pub async fn run_json(&self, initial: Value) -> Result<Value> {
        let state = SalesforceState::from_json(initial)?;
        Ok(self.apply(state).await?.to_json())
    }
}

#[async_trait]
impl Operation<Session> for Execute {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        state.logger.debug(format!(
            "Executing {} operation(s)",
            self.operations.len()
        ));
        let state = CreateConnection::with_connector(self.connector.clone())
            .apply(state)
            .await?;
        let state = Login.apply(state).await?;
        let state = self.operations.apply(state).await?;
        CleanupState.apply(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sf_ops_common::{steps, Attributes, ErrorKind};

    use crate::fake::FakeConnection;
    use crate::operations::{create, query};

    fn fake_connector(conn: Arc<FakeConnection>) -> Connector {
        Arc::new(move |_: &Configuration| -> Result<Session> { Ok(conn.clone() as Session) })
    }

    fn initial() -> Value {
        json!({
            "configuration": {
                "loginUrl": "https://login.salesforce.com",
                "username": "ada@example.com",
                "password": "pw",
                "securityToken": "TOKEN"
            },
            "data": {"lastName": "Lovelace"}
        })
    }

    #[tokio::test]
    async fn test_create_connection_requires_login_url() {
        let conn = Arc::new(FakeConnection::new());
        let state = SalesforceState::from_json(json!({"configuration": {}, "data": {}})).unwrap();

        let err = CreateConnection::with_connector(fake_connector(conn.clone()))
            .apply(state)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: loginUrl missing from configuration.");
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_connection_attaches_session() {
        let state = SalesforceState::from_json(initial()).unwrap();
        let state = create_connection().apply(state).await.unwrap();
        assert!(state.connection.is_some());
    }

    #[tokio::test]
    async fn test_login_uses_configured_username() {
        let conn = Arc::new(FakeConnection::new());
        let state = SalesforceState::from_json(initial())
            .unwrap()
            .with_connection(conn.clone() as Session);

        let out = login().apply(state).await.unwrap();

        assert!(out.references.is_empty());
        let calls = conn.calls();
        assert_eq!(calls[0].method, "login");
        assert_eq!(calls[0].payload, json!({"username": "ada@example.com"}));
    }

    #[tokio::test]
    async fn test_cleanup_drops_session() {
        let state = State::<()>::default().with_connection(());
        let out = cleanup_state().apply(state).await.unwrap();
        assert!(out.connection.is_none());
    }

    #[tokio::test]
    async fn test_execute_runs_bootstrap_ops_and_teardown() {
        let conn = Arc::new(FakeConnection::new());
        let job = execute(steps![
            create("Contact", Attributes::new().with("LastName", "Lovelace")),
            query("SELECT Id FROM Contact"),
        ])
        .with_connector(fake_connector(conn.clone()));

        let state = SalesforceState::from_json(initial()).unwrap();
        let out = job.apply(state).await.unwrap();

        assert!(out.connection.is_none());
        assert_eq!(out.references.len(), 2);
        assert_eq!(out.references.get(1).unwrap()["id"], "ConFAKE00000001");

        let methods: Vec<_> = conn.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["login", "create", "query"]);
    }

    #[tokio::test]
    async fn test_execute_stops_on_first_error() {
        let conn = Arc::new(FakeConnection::new().fail_on("login", "INVALID_LOGIN"));
        let job = execute(steps![create("Contact", Attributes::new())])
            .with_connector(fake_connector(conn.clone()));

        let err = job.run_json(initial()).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Remote(ref m) if m == "INVALID_LOGIN"));
        assert_eq!(conn.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_run_json_output_shape() {
        let conn = Arc::new(FakeConnection::new());
        let job = execute(Vec::new()).with_connector(fake_connector(conn));

        let out = job.run_json(initial()).await.unwrap();
        assert_eq!(out["data"], json!({"lastName": "Lovelace"}));
        assert_eq!(out["references"], json!([]));
        assert_eq!(out["configuration"]["username"], "ada@example.com");
    }
}
