//! End-to-end manifest flow against the in-memory agent
//!
//! Manifest files on disk -> load -> reconcile -> edit -> reconcile again.

use acl_client::{Method, token};
use acl_core::{AclManifest, ObjectKind, ReconcileOptions, Reconciler};
use acl_test_utils::{ConfigDir, FakeConsul};
use pretty_assertions::assert_eq;

const READONLY_V1: &str = "key_prefix \"\" { policy = \"read\" }\n";
const READONLY_V2: &str =
    "key_prefix \"\" { policy = \"read\" }\nnode_prefix \"\" { policy = \"read\" }\n";

const MANIFEST_V1: &str = r#"
[[policies]]
name = "readonly"
description = "RO access"
rules_file = "policies/readonly.hcl"

[[policies]]
name = "deploy"
rules = 'service_prefix "" { policy = "write" }'

[[tokens]]
name = "ci"
secret = "45a3bd52-07c7-47a4-52fd-0745e0cfe967"
description = "CI runner"
policies = ["readonly", "deploy"]
"#;

const MANIFEST_V2: &str = r#"
[[policies]]
name = "readonly"
description = "RO access"
rules_file = "policies/readonly.hcl"

[[policies]]
name = "deploy"
state = "absent"

[[tokens]]
name = "ci"
secret = "45a3bd52-07c7-47a4-52fd-0745e0cfe967"
description = "CI runner"
policies = ["readonly"]
"#;

fn apply() -> ReconcileOptions {
    ReconcileOptions { dry_run: false }
}

#[test]
fn manifest_lifecycle_converges() {
    let dir = ConfigDir::new();
    dir.write_file("policies/readonly.hcl", READONLY_V1);
    let path = dir.write_file("acl.toml", MANIFEST_V1);
    let consul = FakeConsul::new();

    // First run creates everything
    let manifest = AclManifest::load(&path).unwrap();
    let report = Reconciler::new(&consul, apply()).apply_manifest(&manifest);
    assert!(report.success(), "{:#?}", report.results);
    assert_eq!(report.changed(), 3);
    assert_eq!(consul.policy("readonly").unwrap().rules(), READONLY_V1);

    let ci = consul.token("ci").unwrap();
    assert_eq!(ci.accessor, token::accessor_from_name("ci"));
    assert_eq!(token::link_names(&ci).0, vec!["deploy", "readonly"]);

    // Second run is a no-op
    consul.clear_requests();
    let report = Reconciler::new(&consul, apply()).apply_manifest(&manifest);
    assert_eq!(report.changed(), 0);
    assert!(consul.mutating_requests().is_empty());

    // Edit rules and drop a policy
    dir.write_file("policies/readonly.hcl", READONLY_V2);
    let path = dir.write_file("acl.toml", MANIFEST_V2);
    let manifest = AclManifest::load(&path).unwrap();

    let dry_run = ReconcileOptions { dry_run: true };
    let plan = Reconciler::new(&consul, dry_run).apply_manifest(&manifest);
    assert!(plan.has_drift());
    assert!(consul.mutating_requests().is_empty());

    let report = Reconciler::new(&consul, apply()).apply_manifest(&manifest);
    assert!(report.success(), "{:#?}", report.results);

    let summary: Vec<_> = report
        .results
        .iter()
        .map(|r| (r.kind, r.name.as_str(), r.comment.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ObjectKind::Policy, "readonly", "Policy readonly was updated"),
            (ObjectKind::Token, "ci", "Token ci was updated"),
            (ObjectKind::Policy, "deploy", "Policy deploy was deleted"),
        ]
    );
    assert_eq!(report.results[0].changes.fields().collect::<Vec<_>>(), vec!["rules"]);
    assert_eq!(report.results[1].changes.fields().collect::<Vec<_>>(), vec!["policies"]);
    assert!(consul.policy("deploy").is_none());
    assert_eq!(token::link_names(&consul.token("ci").unwrap()).0, vec!["readonly"]);
}

#[test]
fn yaml_manifest_matches_toml() {
    let dir = ConfigDir::new();
    dir.write_file("policies/readonly.hcl", READONLY_V1);
    let toml_path = dir.write_file("acl.toml", MANIFEST_V1);
    let yaml_path = dir.write_file(
        "acl.yaml",
        r#"
policies:
  - name: readonly
    description: RO access
    rules_file: policies/readonly.hcl
  - name: deploy
    rules: 'service_prefix "" { policy = "write" }'
tokens:
  - name: ci
    secret: 45a3bd52-07c7-47a4-52fd-0745e0cfe967
    description: CI runner
    policies: [readonly, deploy]
"#,
    );

    assert_eq!(AclManifest::load(&yaml_path).unwrap(), AclManifest::load(&toml_path).unwrap());
}

#[test]
fn server_failure_is_isolated_to_its_entry() {
    let dir = ConfigDir::new();
    dir.write_file("policies/readonly.hcl", READONLY_V1);
    let path = dir.write_file("acl.toml", MANIFEST_V1);
    let consul = FakeConsul::new().fail_on(Method::Put, "acl/token", 500);

    let manifest = AclManifest::load(&path).unwrap();
    let report = Reconciler::new(&consul, apply()).apply_manifest(&manifest);

    assert!(!report.success());
    assert_eq!(report.failed(), 1);
    assert!(report.results[2].comment.starts_with("Error updating or creating token"));
    assert_eq!(consul.policy_count(), 2);
    assert_eq!(consul.token_count(), 0);
}
