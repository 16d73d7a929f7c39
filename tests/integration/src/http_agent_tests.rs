//! AclContext over real HTTP
//!
//! Settings come from a project config pointing at a wiremock agent. The
//! client is blocking, so each run happens inside `spawn_blocking`.

use acl_core::{AclContext, AclManifest, ReconcileOptions, SettingsResolver};
use acl_test_utils::ConfigDir;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RULES: &str = "key_prefix \"\" { policy = \"read\" }";

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task panicked")
}

/// Project pointing at `server` with a management token in the local layer
fn context_for(server: &MockServer, dry_run: bool) -> (ConfigDir, AclContext) {
    let dir = ConfigDir::new();
    dir.write_project_config(&format!("[consul]\nhost = \"{}\"\n", server.uri()));
    dir.write_local_config("[consul]\ntoken = \"mgmt-token\"\n");

    let settings = SettingsResolver::new(dir.root())
        .with_global_config_dir(dir.global_dir())
        .resolve()
        .unwrap();
    (dir, AclContext::new(settings, ReconcileOptions { dry_run }))
}

#[tokio::test(flavor = "multi_thread")]
async fn manage_policy_creates_through_resolved_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .and(header("X-Consul-Token", "mgmt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/acl/policy"))
        .and(header("X-Consul-Token", "mgmt-token"))
        .and(body_json(json!({ "Name": "readonly", "Description": "RO", "Rules": RULES })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "e359bd81-baca-903e-7e64-1ccd9fdc78f5",
            "Name": "readonly",
            "Description": "RO",
            "Rules": RULES
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut ctx) = context_for(&server, false);
    let result =
        blocking(move || ctx.manage_policy("readonly", Some("RO"), RULES, None, None)).await;

    assert_eq!(result.result, Some(true));
    assert_eq!(result.comment, "Policy readonly was created");
}

#[tokio::test(flavor = "multi_thread")]
async fn check_reads_full_policy_and_never_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ID": "p-1", "Name": "readonly", "Description": "RO" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policy/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "p-1", "Name": "readonly", "Description": "RO", "Rules": "old"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manifest = AclManifest::parse_toml(&format!(
        "[[policies]]\nname = \"readonly\"\ndescription = \"RO\"\nrules = '{RULES}'\n"
    ))
    .unwrap();

    let (_dir, mut ctx) = context_for(&server, true);
    let report = blocking(move || ctx.apply_manifest(&manifest, None, None)).await.unwrap();

    assert!(report.dry_run);
    assert!(report.has_drift());
    assert_eq!(report.results[0].comment, "Policy readonly would be updated");
    assert_eq!(report.results[0].changes.get("rules").unwrap().old, json!("old"));

    let writes = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() != "GET")
        .count();
    assert_eq!(writes, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn host_override_beats_settings() {
    let configured = MockServer::start().await;
    let override_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&override_server)
        .await;

    let (_dir, mut ctx) = context_for(&configured, false);
    let host = override_server.uri();
    let result = blocking(move || ctx.remove_policy("readonly", Some(&host), None)).await;

    assert_eq!(result.result, Some(true));
    assert!(result.changes.is_empty());
    assert!(configured.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn forbidden_token_becomes_failed_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/acl/policies"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied"))
        .mount(&server)
        .await;

    let (_dir, mut ctx) = context_for(&server, false);
    let result = blocking(move || ctx.manage_policy("readonly", None, RULES, None, None)).await;

    assert!(result.is_failure());
    assert!(result.comment.contains("403"), "comment: {}", result.comment);
    assert!(result.comment.contains("Permission denied"), "comment: {}", result.comment);
}
