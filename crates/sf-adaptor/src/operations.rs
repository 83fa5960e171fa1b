//! Record operations: create, update, upsert, query and describe.
//!
//! Each one makes at most one remote call through the state's connection and
//! records the raw result at the front of `references`.

use async_trait::async_trait;
use serde_json::Value;

use sf_ops_common::{expand_references, Attributes, Operation, Result};

use crate::connection::{SalesforceState, Session};

/// See [`create`] and [`create_if`].
pub struct Create {
    sobject: String,
    attrs: Attributes<Session>,
    logical: bool,
}

/// Create one `sobject` record from `attrs`.
///
/// ```rust,ignore
/// create("Contact", Attributes::new()
///     .with("LastName", "Lovelace")
///     .with("AccountId", Attr::reference(0)))
/// ```
pub fn create(sobject: impl Into<String>, attrs: Attributes<Session>) -> Create {
    create_if(true, sobject, attrs)
}

/// [`create`] when `logical` holds; otherwise the state passes through.
pub fn create_if(logical: bool, sobject: impl Into<String>, attrs: Attributes<Session>) -> Create {
    Create {
        sobject: sobject.into(),
        attrs,
        logical,
    }
}

#[async_trait]
impl Operation<Session> for Create {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        if !self.logical {
            state.logger.info(format!(
                "Not creating {} because logical is false.",
                self.sobject
            ));
            return Ok(state);
        }

        let record = expand_references(&state, &self.attrs)?;
        state.logger.info(format!(
            "Creating {} {}",
            self.sobject,
            Value::Object(record.clone())
        ));

        let result = state.connection()?.create(&self.sobject, &record).await?;
        state.logger.debug(format!("Result : {}", result));
        Ok(state.push_reference(result))
    }
}

/// See [`update`].
pub struct Update {
    sobject: String,
    attrs: Attributes<Session>,
}

/// Update the `sobject` record named by the `Id` attribute.
pub fn update(sobject: impl Into<String>, attrs: Attributes<Session>) -> Update {
    Update {
        sobject: sobject.into(),
        attrs,
    }
}

#[async_trait]
impl Operation<Session> for Update {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        let record = expand_references(&state, &self.attrs)?;
        state.logger.info(format!(
            "Updating {} {}",
            self.sobject,
            Value::Object(record.clone())
        ));

        let result = state.connection()?.update(&self.sobject, &record).await?;
        state.logger.debug(format!("Result : {}", result));
        Ok(state.push_reference(result))
    }
}

/// See [`upsert`] and [`upsert_if`].
pub struct Upsert {
    sobject: String,
    external_id: String,
    attrs: Attributes<Session>,
    logical: bool,
}

/// Insert or update an `sobject` record matched on `external_id`, whose value
/// is taken from `attrs`.
pub fn upsert(
    sobject: impl Into<String>,
    external_id: impl Into<String>,
    attrs: Attributes<Session>,
) -> Upsert {
    upsert_if(true, sobject, external_id, attrs)
}

/// [`upsert`] when `logical` holds; otherwise the state passes through.
pub fn upsert_if(
    logical: bool,
    sobject: impl Into<String>,
    external_id: impl Into<String>,
    attrs: Attributes<Session>,
) -> Upsert {
    Upsert {
        sobject: sobject.into(),
        external_id: external_id.into(),
        attrs,
        logical,
    }
}

#[async_trait]
impl Operation<Session> for Upsert {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        if !self.logical {
            state.logger.info(format!(
                "Not upserting {} because logical is false.",
                self.sobject
            ));
            return Ok(state);
        }

        let record = expand_references(&state, &self.attrs)?;
        state.logger.info(format!(
            "Upserting {} with externalId {} : {}",
            self.sobject,
            self.external_id,
            Value::Object(record.clone())
        ));

        let result = state
            .connection()?
            .upsert(&self.sobject, &self.external_id, &record)
            .await?;
        state.logger.debug(format!("Result : {}", result));
        Ok(state.push_reference(result))
    }
}

/// See [`query`].
pub struct Query {
    soql: String,
}

/// Run a SOQL query, reading every page. Records
/// `{totalSize, done, records}`.
pub fn query(soql: impl Into<String>) -> Query {
    Query { soql: soql.into() }
}

#[async_trait]
impl Operation<Session> for Query {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        state.logger.info(format!("Executing query: {}", self.soql));
        let result = state.connection()?.query(&self.soql).await?;
        state.logger.debug(format!(
            "Fetched {} record(s)",
            result["totalSize"].as_u64().unwrap_or(0)
        ));
        Ok(state.push_reference(result))
    }
}

/// See [`describe`].
pub struct Describe {
    sobject: String,
}

/// Log the label and field count of `sobject`. Records nothing.
pub fn describe(sobject: impl Into<String>) -> Describe {
    Describe {
        sobject: sobject.into(),
    }
}

#[async_trait]
impl Operation<Session> for Describe {
    async fn apply(&self, state: SalesforceState) -> Result<SalesforceState> {
        let meta = state.connection()?.describe(&self.sobject).await?;
        state.logger.info(format!("Label : {}", meta.label));
        state.logger.info(format!("Num of Fields : {}", meta.fields.len()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use sf_ops_common::{each, steps, Attr, BoxedOperation, ErrorKind, State};

    use crate::fake::FakeConnection;

    fn state_with(conn: &Arc<FakeConnection>) -> SalesforceState {
        let session: Session = conn.clone();
        State::new(json!({}), json!({"firstName": "Ada", "lastName": "Lovelace"}))
            .with_connection(session)
    }

    #[tokio::test]
    async fn test_create_records_result() {
        let conn = Arc::new(FakeConnection::new());
        let attrs = Attributes::new()
            .with("FirstName", Attr::source_value("$.data.firstName").unwrap())
            .with("LastName", "Lovelace");

        let out = create("Contact", attrs).apply(state_with(&conn)).await.unwrap();

        assert_eq!(out.references.len(), 1);
        assert_eq!(out.references.latest().unwrap()["id"], "ConFAKE00000001");
        let calls = conn.calls();
        assert_eq!(calls[0].payload, json!({"FirstName": "Ada", "LastName": "Lovelace"}));
    }

    #[tokio::test]
    async fn test_create_if_false_makes_no_call() {
        let conn = Arc::new(FakeConnection::new());
        let before = state_with(&conn).push_reference(json!({"id": "prior"}));
        let expected = before.references.clone();

        let out = create_if(false, "Contact", Attributes::new().with("LastName", "X"))
            .apply(before)
            .await
            .unwrap();

        assert_eq!(out.references, expected);
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_if_false_makes_no_call() {
        let conn = Arc::new(FakeConnection::new());
        let before = state_with(&conn);
        let out = upsert_if(false, "Contact", "Ext_UID__c", Attributes::new())
            .apply(before)
            .await
            .unwrap();

        assert!(out.references.is_empty());
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_update_use_previous_reference() {
        let conn = Arc::new(FakeConnection::new());
        let job: Vec<BoxedOperation<Session>> = steps![
            upsert(
                "Account",
                "Ext_UID__c",
                Attributes::new().with("Ext_UID__c", "A-1").with("Name", "Acme")
            ),
            update(
                "Account",
                Attributes::new().with("Id", Attr::reference(0)).with("Phone", "555")
            ),
        ];

        let out = job.apply(state_with(&conn)).await.unwrap();
        assert_eq!(out.references.len(), 2);

        let calls = conn.calls();
        assert_eq!(calls[1].method, "update");
        assert_eq!(calls[1].payload, json!({"Id": "AccFAKE00000001", "Phone": "555"}));
    }

    #[tokio::test]
    async fn test_query_records_result() {
        let conn = Arc::new(FakeConnection::new().with_query_records(vec![json!({"Id": "001A"})]));
        let out = query("SELECT Id FROM Account").apply(state_with(&conn)).await.unwrap();

        assert_eq!(
            out.references.latest(),
            Some(&json!({"totalSize": 1, "done": true, "records": [{"Id": "001A"}]}))
        );
    }

    #[tokio::test]
    async fn test_describe_leaves_state_alone() {
        let conn = Arc::new(FakeConnection::new());
        let out = describe("Account").apply(state_with(&conn)).await.unwrap();
        assert!(out.references.is_empty());
        assert_eq!(conn.calls()[0].method, "describe");
    }

    #[tokio::test]
    async fn test_describe_error_propagates() {
        let conn = Arc::new(FakeConnection::new().fail_on("describe", "NOT_FOUND"));
        let err = describe("Nope__c").apply(state_with(&conn)).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Remote(_)));
    }

    #[tokio::test]
    async fn test_remote_rejection_stops_chain() {
        let conn = Arc::new(FakeConnection::new().fail_on("create", "DUPLICATE_VALUE"));
        let job: Vec<BoxedOperation<Session>> = steps![
            create("Contact", Attributes::new().with("LastName", "A")),
            query("SELECT Id FROM Contact"),
        ];
        assert!(job.apply(state_with(&conn)).await.is_err());
        assert_eq!(conn.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_without_connection() {
        let err = create("Contact", Attributes::new())
            .apply(State::default())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Connection(_)));
    }

    #[tokio::test]
    async fn test_each_creates_per_item() {
        let conn = Arc::new(FakeConnection::new());
        let state = state_with(&conn).with_data(json!({"people": [{"n": "a"}, {"n": "b"}, {"n": "c"}]}));
        let op = each(
            "$.data.people[*]",
            create(
                "Contact",
                Attributes::new().with("LastName", Attr::source_value("$.data.n").unwrap()),
            ),
        );

        let out = op.apply(state).await.unwrap();
        assert_eq!(out.references.len(), 3);
        let names: Vec<_> = conn.calls().iter().map(|c| c.payload["LastName"].clone()).collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
    }
}
