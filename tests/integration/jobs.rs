use std::sync::Arc;

use serde_json::{json, Value};

use sf_ops::adaptor::{
    combine, create, create_if, each, execute, field, fields, join, map, steps, Attr, Attributes,
    Configuration, Connector, FakeAdaptor, FakeConnection, Result, Session, State,
};

fn fake(conn: &Arc<FakeConnection>) -> Connector {
    let conn = conn.clone();
    Arc::new(move |_: &Configuration| -> Result<Session> { Ok(conn.clone() as Session) })
}

fn initial(data: Value) -> Value {
    json!({
        "configuration": {"loginUrl": "https://login.salesforce.com", "username": "ada@example.com"},
        "data": data
    })
}

fn contact() -> Attributes<Session> {
    Attributes::new().with("LastName", Attr::source_value("$.data.name").unwrap())
}

#[tokio::test]
async fn test_each_threads_references_in_order() {
    let conn = Arc::new(FakeConnection::new());
    let job = execute(steps![each(
        "$.data.people[*]",
        create("Contact", contact())
    )])
    .with_connector(fake(&conn));

    let output = job
        .run_json(initial(json!({"people": [{"name": "a"}, {"name": "b"}, {"name": "c"}]})))
        .await
        .unwrap();

    let ids: Vec<_> = output["references"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(
        ids,
        vec![json!("ConFAKE00000003"), json!("ConFAKE00000002"), json!("ConFAKE00000001")]
    );
    assert_eq!(output["data"], json!({"name": "c"}));
}

#[tokio::test]
async fn test_map_discards_results() {
    let conn = Arc::new(FakeConnection::new());
    let job = execute(steps![map("$.data.people[*]", create("Contact", contact()))])
        .with_connector(fake(&conn));

    let output = job
        .run_json(initial(json!({"people": [{"name": "a"}, {"name": "b"}]})))
        .await
        .unwrap();

    assert_eq!(output["references"], json!([]));
    assert_eq!(conn.calls().iter().filter(|c| c.method == "create").count(), 2);
}

#[tokio::test]
async fn test_join_keeps_existing_fields() {
    let conn = Arc::new(FakeConnection::new());
    let job = execute(steps![each(
        join("$.data.people[*]", "$.data.accountId", "AccountId").unwrap(),
        create(
            "Contact",
            Attributes::new()
                .with("LastName", Attr::source_value("$.data.name").unwrap())
                .with("AccountId", Attr::source_value("$.data.AccountId").unwrap())
        )
    )])
    .with_connector(fake(&conn));

    job.run_json(initial(json!({
        "accountId": "001A",
        "people": [{"name": "a"}, {"name": "b", "AccountId": "001B"}]
    })))
    .await
    .unwrap();

    let accounts: Vec<_> = conn
        .calls()
        .iter()
        .filter(|c| c.method == "create")
        .map(|c| c.payload["AccountId"].clone())
        .collect();
    assert_eq!(accounts, vec![json!("001A"), json!("001B")]);
}

#[tokio::test]
async fn test_combine_and_conditional_steps() {
    let conn = Arc::new(FakeConnection::new());
    let job = execute(steps![combine(steps![
        create_if(false, "Contact", Attributes::new().with("LastName", "skipped")),
        create("Contact", Attributes::new().with("LastName", "kept")),
    ])])
    .with_connector(fake(&conn));

    let output = job.run_json(initial(json!({}))).await.unwrap();
    assert_eq!(output["references"].as_array().unwrap().len(), 1);
    let methods: Vec<_> = conn.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec!["login", "create"]);
}

#[tokio::test]
async fn test_fake_adaptor_without_connection() {
    let state = State::<()>::new(json!({}), json!({"name": "Acme"}));
    let out = FakeAdaptor::execute(
        state,
        steps![FakeAdaptor::create::<()>(
            "Account",
            fields([field("Name", Attr::source_value("$.data.name").unwrap()), "Website".into()])
        )],
    )
    .await
    .unwrap();

    assert_eq!(
        out.references.latest(),
        Some(&json!({"sObject": "Account", "fields": {"Name": "Acme"}, "Id": 1}))
    );
}
