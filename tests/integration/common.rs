use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DATA: &str = "/services/data/v62.0";

/// A mock org that accepts one SOAP login and points the session back at
/// itself.
pub async fn mock_org() -> MockServer {
    let server = MockServer::start().await;
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
  <soapenv:Body><loginResponse><result>
    <passwordExpired>false</passwordExpired>
    <serverUrl>{}/services/Soap/u/62.0/00Dxx0000001gPL</serverUrl>
    <sessionId>00Dxx!SESSION</sessionId>
    <userId>005xx000001Sv6m</userId>
  </result></loginResponse></soapenv:Body>
</soapenv:Envelope>"#,
        server.uri()
    );

    Mock::given(method("POST"))
        .and(path("/services/Soap/u/62.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;
    server
}

pub fn initial_state(server: &MockServer, data: Value) -> Value {
    json!({
        "configuration": {
            "loginUrl": server.uri(),
            "username": "ada@example.com",
            "password": "pw",
            "securityToken": "TOKEN"
        },
        "data": data
    })
}
