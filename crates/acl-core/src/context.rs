//! Explicit execution context
//!
//! An [`AclContext`] carries the resolved settings, the run options and the
//! client cache. Every entry point takes it instead of reading ambient state.

use std::sync::Arc;

use acl_client::{ClientCache, ConnectionParams, ConsulClient, TokenSpec};

use crate::config::{AclManifest, Settings};
use crate::reconcile::{ApplyReport, ObjectKind, ReconcileOptions, Reconciler, StateResult};
use crate::Result;

/// Settings, options and cached clients for one process
#[derive(Debug)]
pub struct AclContext {
    settings: Settings,
    options: ReconcileOptions,
    cache: ClientCache,
}

impl AclContext {
    pub fn new(settings: Settings, options: ReconcileOptions) -> Self {
        Self {
            settings,
            options,
            cache: ClientCache::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    /// Resolve connection parameters for optional per-call overrides
    pub fn params(&self, host: Option<&str>, token: Option<&str>) -> ConnectionParams {
        ConnectionParams::resolve(host, token, &self.settings.consul)
    }

    /// Cached client for the resolved parameters
    pub fn client(
        &mut self,
        host: Option<&str>,
        token: Option<&str>,
    ) -> Result<Arc<ConsulClient>> {
        let params = self.params(host, token);
        Ok(self.cache.get_or_build(&params)?)
    }

    fn with_reconciler<F>(
        &mut self,
        kind: ObjectKind,
        name: &str,
        host: Option<&str>,
        token: Option<&str>,
        f: F,
    ) -> StateResult
    where
        F: FnOnce(&Reconciler<'_>) -> StateResult,
    {
        let options = self.options;
        match self.client(host, token) {
            Ok(client) => f(&Reconciler::new(&*client, options)),
            Err(e) => {
                StateResult::failed(kind, name, format!("Error connecting to Consul: {e}"))
            }
        }
    }

    /// Ensure a policy exists with the given description and rules
    pub fn manage_policy(
        &mut self,
        name: &str,
        description: Option<&str>,
        rules: &str,
        host: Option<&str>,
        token: Option<&str>,
    ) -> StateResult {
        self.with_reconciler(ObjectKind::Policy, name, host, token, |r| {
            r.policy_present(name, rules, description)
        })
    }

    /// Ensure a policy is absent
    pub fn remove_policy(
        &mut self,
        name: &str,
        host: Option<&str>,
        token: Option<&str>,
    ) -> StateResult {
        self.with_reconciler(ObjectKind::Policy, name, host, token, |r| r.policy_absent(name))
    }

    /// Ensure a token exists for `name`
    pub fn manage_token(
        &mut self,
        name: &str,
        spec: &TokenSpec,
        host: Option<&str>,
        token: Option<&str>,
    ) -> StateResult {
        self.with_reconciler(ObjectKind::Token, name, host, token, |r| {
            r.token_present(name, spec)
        })
    }

    /// Ensure a token is absent
    pub fn remove_token(
        &mut self,
        name: &str,
        host: Option<&str>,
        token: Option<&str>,
    ) -> StateResult {
        self.with_reconciler(ObjectKind::Token, name, host, token, |r| r.token_absent(name))
    }

    /// Reconcile a whole manifest against one agent
    pub fn apply_manifest(
        &mut self,
        manifest: &AclManifest,
        host: Option<&str>,
        token: Option<&str>,
    ) -> Result<ApplyReport> {
        let options = self.options;
        let client = self.client(host, token)?;
        Ok(Reconciler::new(&*client, options).apply_manifest(manifest))
    }
}
