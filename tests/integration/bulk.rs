use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sf_ops::adaptor::{bulk, execute, steps, BulkOperation, BulkOptions, ErrorKind};

use crate::common::{initial_state, mock_org, DATA};

const JOB_ID: &str = "750xx0000000001";

fn job(state: &str) -> Value {
    json!({
        "id": JOB_ID,
        "state": state,
        "object": "Contact",
        "operation": "insert"
    })
}

fn fast() -> BulkOptions {
    BulkOptions::new()
        .poll_interval(Duration::from_millis(10))
        .poll_timeout(Duration::from_secs(2))
}

async fn mount_completed_job(server: &MockServer, failed_csv: &str) {
    let jobs = format!("{DATA}/jobs/ingest");
    Mock::given(method("POST"))
        .and(path(jobs.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("Open")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{jobs}/{JOB_ID}/batches")))
        .and(body_string("LastName\nLovelace\nHopper\n"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{jobs}/{JOB_ID}")))
        .and(body_json(json!({"state": "UploadComplete"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("UploadComplete")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{jobs}/{JOB_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("JobComplete")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{jobs}/{JOB_ID}/successfulResults")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("\"sf__Id\",\"sf__Created\",LastName\n003xx01,true,Lovelace\n"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{jobs}/{JOB_ID}/failedResults")))
        .respond_with(ResponseTemplate::new(200).set_body_string(failed_csv.to_string()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{jobs}/{JOB_ID}/unprocessedrecords")))
        .respond_with(ResponseTemplate::new(200).set_body_string("LastName\n"))
        .mount(server)
        .await;
}

fn contacts() -> Value {
    json!({"contacts": [{"LastName": "Lovelace"}, {"LastName": "Hopper"}]})
}

#[tokio::test]
async fn test_bulk_insert_records_results() {
    let server = mock_org().await;
    mount_completed_job(
        &server,
        "\"sf__Id\",\"sf__Error\",LastName\n,DUPLICATE_VALUE:duplicate value found,Hopper\n",
    )
    .await;

    let job = execute(steps![bulk(
        "Contact",
        BulkOperation::Insert,
        fast(),
        "$.data.contacts[*]"
    )]);
    let output = job.run_json(initial_state(&server, contacts())).await.unwrap();

    let rows = output["references"][0].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["success"], true);
    assert_eq!(rows[0]["id"], "003xx01");
    assert_eq!(rows[1]["success"], false);
}

#[tokio::test]
async fn test_bulk_fail_on_error_rejects() {
    let server = mock_org().await;
    mount_completed_job(
        &server,
        "\"sf__Id\",\"sf__Error\",LastName\n,DUPLICATE_VALUE:duplicate value found,Hopper\n",
    )
    .await;

    let job = execute(steps![bulk(
        "Contact",
        BulkOperation::Insert,
        fast().fail_on_error(true),
        "$.data.contacts[*]"
    )]);
    let err = job
        .run_json(initial_state(&server, contacts()))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Rejected { .. }));
    assert_eq!(err.payload().unwrap().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_allow_no_op_creates_no_job() {
    let server = mock_org().await;
    Mock::given(method("POST"))
        .and(path(format!("{DATA}/jobs/ingest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("Open")))
        .expect(0)
        .mount(&server)
        .await;

    let job = execute(steps![bulk(
        "Contact",
        BulkOperation::Insert,
        fast().allow_no_op(true),
        "$.data.contacts[*]"
    )]);
    let output = job
        .run_json(initial_state(&server, json!({"contacts": []})))
        .await
        .unwrap();
    assert_eq!(output["references"], json!([]));
}
