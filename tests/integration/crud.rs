use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use sf_ops::adaptor::{
    create, execute, query, steps, update, upsert_if, Attr, Attributes, ErrorKind,
};

use crate::common::{initial_state, mock_org, DATA};

#[tokio::test]
async fn test_create_from_state_data() {
    let server = mock_org().await;
    Mock::given(method("POST"))
        .and(path(format!("{DATA}/sobjects/Contact")))
        .and(body_json(json!({"FirstName": "Ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "003xx000004TmiQAAS", "success": true, "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = execute(steps![create(
        "Contact",
        Attributes::new().with("FirstName", Attr::source_value("$.data.firstName").unwrap())
    )]);
    let output = job
        .run_json(initial_state(&server, json!({"firstName": "Ada"})))
        .await
        .unwrap();

    assert_eq!(
        output["references"],
        json!([{"id": "003xx000004TmiQAAS", "success": true, "errors": []}])
    );
    assert_eq!(output["data"], json!({"firstName": "Ada"}));
    let keys: Vec<_> = output.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["data", "references", "configuration"]);
}

#[tokio::test]
async fn test_update_reads_previous_reference() {
    let server = mock_org().await;
    Mock::given(method("POST"))
        .and(path(format!("{DATA}/sobjects/Account")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "001xx000003DGb2AAG", "success": true, "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DATA}/sobjects/Account/001xx000003DGb2AAG")))
        .and(body_json(json!({"Phone": "555-0100"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let job = execute(steps![
        create("Account", Attributes::new().with("Name", "Acme")),
        update(
            "Account",
            Attributes::new()
                .with("Id", Attr::reference(0))
                .with("Phone", "555-0100")
        ),
    ]);
    let output = job.run_json(initial_state(&server, json!({}))).await.unwrap();

    let references = output["references"].as_array().unwrap();
    assert_eq!(references.len(), 2);
    assert_eq!(references[0]["id"], "001xx000003DGb2AAG");
}

#[tokio::test]
async fn test_upsert_if_false_sends_nothing() {
    let server = mock_org().await;
    Mock::given(path_regex("/sobjects/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let job = execute(steps![upsert_if(
        false,
        "Contact",
        "Ext_UID__c",
        Attributes::new().with("Ext_UID__c", "A-1")
    )]);
    let output = job.run_json(initial_state(&server, json!({}))).await.unwrap();
    assert_eq!(output["references"], json!([]));
}

#[tokio::test]
async fn test_query_reads_every_page() {
    let server = mock_org().await;
    Mock::given(method("GET"))
        .and(path(format!("{DATA}/query")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 2,
            "done": false,
            "nextRecordsUrl": format!("{DATA}/query/01gxx-2000"),
            "records": [{"Id": "001A"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DATA}/query/01gxx-2000")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 2,
            "done": true,
            "records": [{"Id": "001B"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = execute(steps![query("SELECT Id FROM Account")]);
    let output = job.run_json(initial_state(&server, json!({}))).await.unwrap();

    let result = &output["references"][0];
    assert_eq!(result["totalSize"], 2);
    assert_eq!(result["done"], true);
    assert_eq!(result["records"], json!([{"Id": "001A"}, {"Id": "001B"}]));
}

#[tokio::test]
async fn test_missing_login_url_fails_before_any_call() {
    let job = execute(steps![create("Contact", Attributes::new().with("LastName", "X"))]);
    let err = job
        .run_json(json!({"configuration": {"username": "ada@example.com"}, "data": {}}))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Config(_)));
    assert_eq!(
        err.to_string(),
        "Configuration error: loginUrl missing from configuration."
    );
}
