//! Reconciler implementation
//!
//! Each call is one read-decide-write cycle against live server state. This
//! is the only layer that turns errors into failed results.

use acl_client::{AclTransport, TokenSpec, policy, token};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::{AclManifest, EntryState};

use super::outcome::{ApplyReport, ObjectKind, StateResult};

/// Options for reconciliation
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// If true, look up current state and report what would change without
    /// issuing any PUT or DELETE.
    pub dry_run: bool,
}

/// Reconciles desired ACL state against one Consul agent
pub struct Reconciler<'a> {
    transport: &'a dyn AclTransport,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(transport: &'a dyn AclTransport, options: ReconcileOptions) -> Self {
        Self { transport, options }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Ensure a policy exists with the given rules and description
    pub fn policy_present(
        &self,
        name: &str,
        rules: &str,
        description: Option<&str>,
    ) -> StateResult {
        let kind = ObjectKind::Policy;

        if self.is_dry_run() {
            return match policy::find_by_name(self.transport, name) {
                Ok(None) => StateResult::pending(
                    kind,
                    name,
                    policy::creation_record(name, rules, description),
                    format!("Policy {name} would be created"),
                ),
                Ok(Some(existing)) => {
                    let changes = policy::diff(&existing, name, rules, description);
                    if changes.is_empty() {
                        StateResult::unchanged(kind, name)
                    } else {
                        let comment = format!("Policy {name} would be updated");
                        StateResult::pending(kind, name, changes, comment)
                    }
                }
                Err(e) => failed(kind, name, "Error looking up policy", &e),
            };
        }

        match policy::upsert(self.transport, name, rules, description) {
            Ok((_, changes)) if changes.is_empty() => StateResult::unchanged(kind, name),
            Ok((created, changes)) => {
                let verb = if created { "created" } else { "updated" };
                StateResult::applied(kind, name, changes, format!("Policy {name} was {verb}"))
            }
            Err(e) => failed(kind, name, "Error updating or creating policy", &e),
        }
    }

    /// Ensure no policy with this name exists
    pub fn policy_absent(&self, name: &str) -> StateResult {
        let kind = ObjectKind::Policy;

        if self.is_dry_run() {
            return match policy::find_by_name(self.transport, name) {
                Ok(None) => StateResult::unchanged(kind, name),
                Ok(Some(existing)) => StateResult::pending(
                    kind,
                    name,
                    policy::removal_record(&existing),
                    format!("Policy {name} would be deleted"),
                ),
                Err(e) => failed(kind, name, "Error looking up policy", &e),
            };
        }

        match policy::remove(self.transport, name) {
            Ok(changes) if changes.is_empty() => StateResult::unchanged(kind, name),
            Ok(changes) => {
                StateResult::applied(kind, name, changes, format!("Policy {name} was deleted"))
            }
            Err(e) => failed(kind, name, "Error deleting policy", &e),
        }
    }

    /// Ensure a token exists for `name` with the given attributes
    pub fn token_present(&self, name: &str, spec: &TokenSpec) -> StateResult {
        let kind = ObjectKind::Token;

        if self.is_dry_run() {
            return match token::find_by_name_or_accessor(self.transport, Some(name), None) {
                Ok(None) => StateResult::pending(
                    kind,
                    name,
                    token::creation_record(name, spec),
                    format!("Token {name} would be created"),
                ),
                Ok(Some(existing)) if existing.secret.as_deref() != Some(spec.secret.as_str()) => {
                    let comment = format!("Token {name} exists; its secret cannot be changed");
                    StateResult::failed(kind, name, comment)
                }
                Ok(Some(existing)) => {
                    let changes = token::diff(
                        &existing,
                        spec.description.as_deref(),
                        &spec.policies,
                        &spec.roles,
                    );
                    if changes.is_empty() {
                        StateResult::unchanged(kind, name)
                    } else {
                        let comment = format!("Token {name} would be updated");
                        StateResult::pending(kind, name, changes, comment)
                    }
                }
                Err(e) => failed(kind, name, "Error looking up token", &e),
            };
        }

        match token::upsert(self.transport, name, spec) {
            Ok((_, changes)) if changes.is_empty() => StateResult::unchanged(kind, name),
            Ok((created, changes)) => {
                let verb = if created { "created" } else { "updated" };
                StateResult::applied(kind, name, changes, format!("Token {name} was {verb}"))
            }
            Err(e) => failed(kind, name, "Error updating or creating token", &e),
        }
    }

    /// Ensure no token exists for `name`
    pub fn token_absent(&self, name: &str) -> StateResult {
        let kind = ObjectKind::Token;

        if self.is_dry_run() {
            return match token::find_by_name_or_accessor(self.transport, Some(name), None) {
                Ok(None) => StateResult::unchanged(kind, name),
                Ok(Some(existing)) => StateResult::pending(
                    kind,
                    name,
                    token::removal_record(&existing),
                    format!("Token {name} would be deleted"),
                ),
                Err(e) => failed(kind, name, "Error looking up token", &e),
            };
        }

        match token::remove(self.transport, name) {
            Ok(changes) if changes.is_empty() => StateResult::unchanged(kind, name),
            Ok(changes) => {
                StateResult::applied(kind, name, changes, format!("Token {name} was deleted"))
            }
            Err(e) => failed(kind, name, "Error deleting token", &e),
        }
    }

    /// Reconcile every entry of a manifest
    ///
    /// Order: policies present, tokens present, tokens absent, policies
    /// absent. Tokens may link policies created earlier in the same run, and
    /// policies are only deleted once tokens dropping them are gone. A failed
    /// entry does not stop the run.
    pub fn apply_manifest(&self, manifest: &AclManifest) -> ApplyReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(manifest.policies.len() + manifest.tokens.len());

        for entry in manifest.policies.iter().filter(|p| p.state == EntryState::Present) {
            let description = entry.description.as_deref();
            results.push(self.policy_present(&entry.name, entry.rules(), description));
        }

        for entry in manifest.tokens.iter().filter(|t| t.state == EntryState::Present) {
            let result = match entry.to_spec() {
                Ok(spec) => self.token_present(&entry.name, &spec),
                Err(e) => StateResult::failed(ObjectKind::Token, &entry.name, e.to_string()),
            };
            results.push(result);
        }

        for entry in manifest.tokens.iter().filter(|t| t.state == EntryState::Absent) {
            results.push(self.token_absent(&entry.name));
        }

        for entry in manifest.policies.iter().filter(|p| p.state == EntryState::Absent) {
            results.push(self.policy_absent(&entry.name));
        }

        let report = ApplyReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.is_dry_run(),
            results,
        };
        info!(
            dry_run = report.dry_run,
            total = report.results.len(),
            changed = report.changed(),
            failed = report.failed(),
            "Manifest reconciled"
        );
        report
    }
}

fn failed(kind: ObjectKind, name: &str, context: &str, error: &acl_client::Error) -> StateResult {
    warn!(%kind, name, error = %error, "{context}");
    StateResult::failed(kind, name, format!("{context}: {error}"))
}
