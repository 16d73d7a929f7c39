//! ConsulClient against a real HTTP server (wiremock).
//!
//! The client is blocking, so every call runs inside `spawn_blocking`.

use acl_client::{
    ConnectionParams, ConsulClient, Error, TokenSpec, accessor_from_name, policy, token,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn requests_carry_token_header_and_api_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .and(header("X-Consul-Token", "root-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ID": "1", "Name": "readonly", "Description": "", "Rules": "" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let host = server.uri();
    let policies = blocking(move || {
        let params = ConnectionParams::new(host, Some("root-token".to_string()));
        let client = ConsulClient::new(&params)?;
        policy::list_all(&client)
    })
    .await
    .unwrap();

    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].name, "readonly");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_token_sends_no_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let host = server.uri();
    blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, Some(String::new())))?;
        policy::list_all(&client)
    })
    .await
    .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("x-consul-token"));
}

#[tokio::test(flavor = "multi_thread")]
async fn host_with_api_path_is_not_prefixed_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let host = format!("{}/v1/", server.uri());
    let result = blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, None))?;
        policy::list_all(&client)
    })
    .await;

    assert!(result.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn non_2xx_becomes_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(403).set_body_string("ACL not found"))
        .mount(&server)
        .await;

    let host = server.uri();
    let err = blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, None))?;
        policy::list_all(&client)
    })
    .await
    .unwrap_err();

    match err {
        Error::Transport { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "ACL not found");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn token_404_is_absent() {
    let server = MockServer::start().await;
    let accessor = accessor_from_name("ci");
    Mock::given(method("GET"))
        .and(path(format!("/v1/acl/token/{accessor}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("ACL not found"))
        .mount(&server)
        .await;

    let host = server.uri();
    let found = blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, None))?;
        token::find_by_name_or_accessor(&client, Some("ci"), None)
    })
    .await
    .unwrap();

    assert!(found.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn policy_update_puts_full_payload_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ID": "e359bd81", "Name": "readonly", "Description": "RO access", "Rules": "old" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/policy/e359bd81"))
        .and(body_json(json!({
            "Name": "readonly",
            "Description": "RO access",
            "Rules": "new"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let host = server.uri();
    let (created, changes) = blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, None))?;
        policy::upsert(&client, "readonly", "new", Some("RO access"))
    })
    .await
    .unwrap();

    assert!(!created);
    assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["rules"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn token_create_puts_link_objects() {
    let server = MockServer::start().await;
    let accessor = accessor_from_name("ci");
    Mock::given(method("GET"))
        .and(path(format!("/v1/acl/token/{accessor}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/token"))
        .and(body_json(json!({
            "AccessorID": accessor.to_string(),
            "SecretID": "45a3bd52-07c7-47a4-52fd-0745e0cfe967",
            "Description": "",
            "Policies": [{ "Name": "readonly" }],
            "Roles": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let host = server.uri();
    let (created, _) = blocking(move || {
        let client = ConsulClient::new(&ConnectionParams::new(host, None))?;
        let spec = TokenSpec {
            secret: "45a3bd52-07c7-47a4-52fd-0745e0cfe967".to_string(),
            description: None,
            policies: vec!["readonly".to_string()],
            roles: Vec::new(),
        };
        token::upsert(&client, "ci", &spec)
    })
    .await
    .unwrap();

    assert!(created);
}
