//! In-memory stand-in for Consul's ACL endpoints.
//!
//! Realism level: **FAKE**. Routes, status codes and JSON shapes follow the
//! real API closely enough for reconciliation logic; no ACL enforcement.
//!
//! Like a real agent, the policy list returns stubs without `Rules` unless
//! [`FakeConsul::with_full_listing`] is used.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use acl_client::{
    AclTransport, ApiResponse, Link, Method, Policy, Result, Token, TokenSpec, accessor_from_name,
};
use serde_json::{Value, json};
use uuid::Uuid;

/// One request as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct State {
    policies: Vec<Policy>,
    tokens: BTreeMap<Uuid, Token>,
    roles: BTreeSet<String>,
    requests: Vec<RecordedRequest>,
    failures: Vec<(Method, String, u16)>,
    full_listing: bool,
}

/// Fake Consul ACL server
///
/// # Example
///
/// ```rust
/// use acl_client::policy;
/// use acl_test_utils::FakeConsul;
///
/// let rules = "node_prefix \"\" { policy = \"read\" }";
/// let consul = FakeConsul::new().with_policy("readonly", "RO", rules);
/// assert!(policy::find_by_name(&consul, "readonly").unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct FakeConsul {
    state: Mutex<State>,
}

impl FakeConsul {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a policy
    pub fn with_policy(self, name: &str, description: &str, rules: &str) -> Self {
        self.with_state(|s| {
            s.policies.push(Policy {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: description.to_string(),
                rules: Some(rules.to_string()),
            })
        })
    }

    /// Seed a token under the accessor derived from `name`
    pub fn with_token(self, name: &str, spec: &TokenSpec) -> Self {
        let accessor = accessor_from_name(name);
        self.with_state(|s| {
            s.tokens.insert(accessor, token_from_spec(accessor, spec));
        })
    }

    /// Declare a role that token links may reference
    pub fn with_role(self, name: &str) -> Self {
        self.with_state(|s| {
            s.roles.insert(name.to_string());
        })
    }

    /// Return full policies (with rules) from the list endpoint
    pub fn with_full_listing(self) -> Self {
        self.with_state(|s| s.full_listing = true)
    }

    /// Answer requests matching `method` and `path_prefix` with `status`
    pub fn fail_on(self, method: Method, path_prefix: &str, status: u16) -> Self {
        self.with_state(|s| s.failures.push((method, path_prefix.to_string(), status)))
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests that would change server state (PUT/DELETE)
    pub fn mutating_requests(&self) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method.is_mutating())
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    pub fn policy(&self, name: &str) -> Option<Policy> {
        self.lock().policies.iter().find(|p| p.name == name).cloned()
    }

    pub fn policy_count(&self) -> usize {
        self.lock().policies.len()
    }

    pub fn token(&self, name: &str) -> Option<Token> {
        self.lock().tokens.get(&accessor_from_name(name)).cloned()
    }

    pub fn token_count(&self) -> usize {
        self.lock().tokens.len()
    }
}

fn token_from_spec(accessor: Uuid, spec: &TokenSpec) -> Token {
    Token {
        accessor,
        secret: Some(spec.secret.clone()),
        description: spec.description.clone().unwrap_or_default(),
        policies: spec.policies.iter().map(Link::by_name).collect(),
        roles: spec.roles.iter().map(Link::by_name).collect(),
    }
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, "ACL not found")
}

fn bad_request(message: impl Into<String>) -> ApiResponse {
    ApiResponse::new(400, message)
}

fn str_field(body: Option<&Value>, field: &str) -> String {
    body.and_then(|b| b.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn link_names(body: Option<&Value>, field: &str) -> Vec<String> {
    body.and_then(|b| b.get(field))
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|l| l.get("Name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl State {
    fn route(&mut self, method: Method, path: &str, body: Option<&Value>) -> ApiResponse {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            (Method::Get, ["acl", "policies"]) => {
                let listing: Vec<Policy> = self
                    .policies
                    .iter()
                    .cloned()
                    .map(|mut p| {
                        if !self.full_listing {
                            p.rules = None;
                        }
                        p
                    })
                    .collect();
                ApiResponse::ok_json(&json!(listing))
            }
            (Method::Get, ["acl", "policy", id]) => {
                match self.policies.iter().find(|p| p.id == *id) {
                    Some(p) => ApiResponse::ok_json(&json!(p)),
                    None => not_found(),
                }
            }
            (Method::Put, ["acl", "policy"]) => self.create_policy(body),
            (Method::Put, ["acl", "policy", id]) => self.update_policy(id, body),
            (Method::Delete, ["acl", "policy", id]) => {
                let before = self.policies.len();
                self.policies.retain(|p| p.id != *id);
                if self.policies.len() == before {
                    not_found()
                } else {
                    ApiResponse::ok_json(&json!(true))
                }
            }
            (Method::Get, ["acl", "token", accessor]) => {
                match Uuid::parse_str(accessor).ok().and_then(|a| self.tokens.get(&a)) {
                    Some(t) => ApiResponse::ok_json(&json!(t)),
                    None => not_found(),
                }
            }
            (Method::Put, ["acl", "token"]) => self.write_token(None, body),
            (Method::Put, ["acl", "token", accessor]) => match Uuid::parse_str(accessor) {
                Ok(a) if self.tokens.contains_key(&a) => self.write_token(Some(a), body),
                _ => not_found(),
            },
            (Method::Delete, ["acl", "token", accessor]) => {
                match Uuid::parse_str(accessor).ok().and_then(|a| self.tokens.remove(&a)) {
                    Some(_) => ApiResponse::ok_json(&json!(true)),
                    None => not_found(),
                }
            }
            _ => ApiResponse::new(405, format!("{method} {path} not supported")),
        }
    }

    fn create_policy(&mut self, body: Option<&Value>) -> ApiResponse {
        if body.and_then(|b| b.get("ID")).is_some() {
            return bad_request("Cannot specify an ID when creating a policy");
        }
        let name = str_field(body, "Name");
        if name.is_empty() {
            return bad_request("Invalid Policy: no Name is set");
        }
        if self.policies.iter().any(|p| p.name == name) {
            return bad_request(format!(
                "Invalid Policy: A Policy with Name {name:?} already exists"
            ));
        }
        let policy = Policy {
            id: Uuid::new_v4().to_string(),
            name,
            description: str_field(body, "Description"),
            rules: Some(str_field(body, "Rules")),
        };
        let response = ApiResponse::ok_json(&json!(policy));
        self.policies.push(policy);
        response
    }

    fn update_policy(&mut self, id: &str, body: Option<&Value>) -> ApiResponse {
        let Some(policy) = self.policies.iter_mut().find(|p| p.id == id) else {
            return not_found();
        };
        policy.name = str_field(body, "Name");
        policy.description = str_field(body, "Description");
        policy.rules = Some(str_field(body, "Rules"));
        ApiResponse::ok_json(&json!(policy))
    }

    fn write_token(&mut self, existing: Option<Uuid>, body: Option<&Value>) -> ApiResponse {
        let accessor = match existing {
            Some(a) => a,
            None => match Uuid::parse_str(&str_field(body, "AccessorID")) {
                Ok(a) if self.tokens.contains_key(&a) => {
                    return bad_request("Invalid Token: AccessorID is already in use");
                }
                Ok(a) => a,
                Err(_) => Uuid::new_v4(),
            },
        };

        let policies = link_names(body, "Policies");
        if let Some(missing) = policies
            .iter()
            .find(|n| !self.policies.iter().any(|p| &p.name == *n))
        {
            return bad_request(format!("cannot find policy {missing:?}"));
        }
        let roles = link_names(body, "Roles");
        if let Some(missing) = roles.iter().find(|n| !self.roles.contains(*n)) {
            return bad_request(format!("cannot find role {missing:?}"));
        }

        let secret = str_field(body, "SecretID");
        if let Some(current) = existing.and_then(|a| self.tokens.get(&a))
            && current.secret.as_deref() != Some(secret.as_str())
        {
            return bad_request("Changing a token's SecretID is not permitted");
        }

        let token = Token {
            accessor,
            secret: Some(secret),
            description: str_field(body, "Description"),
            policies: policies.iter().map(Link::by_name).collect(),
            roles: roles.iter().map(Link::by_name).collect(),
        };
        let response = ApiResponse::ok_json(&json!(token));
        self.tokens.insert(accessor, token);
        response
    }
}

impl AclTransport for FakeConsul {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        if let Some((_, _, status)) = state
            .failures
            .iter()
            .find(|(m, prefix, _)| *m == method && path.starts_with(prefix.as_str()))
        {
            return Ok(ApiResponse::new(*status, "injected failure"));
        }

        Ok(state.route(method, path, body))
    }
}
