//! Declarative ACL manifest
//!
//! ```toml
//! [[policies]]
//! name = "readonly"
//! description = "RO access"
//! rules_file = "policies/readonly.hcl"
//!
//! [[policies]]
//! name = "legacy"
//! state = "absent"
//!
//! [[tokens]]
//! name = "ci"
//! secret_env = "CI_TOKEN_SECRET"
//! policies = ["readonly"]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use acl_client::TokenSpec;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Names Consul accepts for policies and roles
static ACL_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap());

/// Whether an entry should exist on the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    #[default]
    Present,
    Absent,
}

/// A policy declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Inline rule source
    #[serde(default)]
    pub rules: Option<String>,

    /// Rule source file, relative to the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,

    #[serde(default)]
    pub state: EntryState,
}

impl PolicyEntry {
    /// Rule source; only meaningful after [`AclManifest::load`] or validation
    pub fn rules(&self) -> &str {
        self.rules.as_deref().unwrap_or_default()
    }
}

/// A token declaration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Logical name; the accessor is derived from it
    pub name: String,

    /// Secret given inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Environment variable holding the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub policies: Vec<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub state: EntryState,
}

impl std::fmt::Debug for TokenEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEntry")
            .field("name", &self.name)
            .field("secret", &self.secret.as_ref().map(|_| acl_client::REDACTED))
            .field("secret_env", &self.secret_env)
            .field("description", &self.description)
            .field("policies", &self.policies)
            .field("roles", &self.roles)
            .field("state", &self.state)
            .finish()
    }
}

impl TokenEntry {
    /// Build the desired token attributes, reading `secret_env` if needed
    pub fn to_spec(&self) -> Result<TokenSpec> {
        self.to_spec_with_env(|key| std::env::var(key).ok())
    }

    /// [`TokenEntry::to_spec`] with an explicit environment lookup
    pub fn to_spec_with_env<F>(&self, env: F) -> Result<TokenSpec>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match (&self.secret, &self.secret_env) {
            (Some(secret), _) => secret.clone(),
            (None, Some(var)) => env(var).filter(|s| !s.is_empty()).ok_or_else(|| Error::Secret {
                token: self.name.clone(),
                message: format!("environment variable {var} is not set"),
            })?,
            (None, None) => {
                return Err(Error::Secret {
                    token: self.name.clone(),
                    message: "no secret or secret_env given".to_string(),
                });
            }
        };

        Ok(TokenSpec {
            secret,
            description: self.description.clone(),
            policies: self.policies.clone(),
            roles: self.roles.clone(),
        })
    }
}

/// Policies and tokens to reconcile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclManifest {
    #[serde(default)]
    pub policies: Vec<PolicyEntry>,

    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

impl AclManifest {
    /// Parse TOML content
    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse YAML content
    pub fn parse_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a manifest, picking the format from the file extension
    ///
    /// `rules_file` references are read relative to the manifest's directory
    /// and the result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed = match extension.as_deref() {
            Some("toml") => Self::parse_toml(&content),
            Some("yaml" | "yml") => Self::parse_yaml(&content),
            Some("json") => serde_json::from_str(&content).map_err(Error::from),
            _ => {
                return Err(Error::manifest(
                    path,
                    "unsupported extension (expected .toml, .yaml, .yml or .json)",
                ));
            }
        };
        let mut manifest = parsed.map_err(|e| Error::manifest(path, e.to_string()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in &mut manifest.policies {
            if let Some(ref file) = entry.rules_file {
                if entry.rules.is_some() {
                    return Err(Error::manifest(
                        path,
                        format!("policy '{}' sets both rules and rules_file", entry.name),
                    ));
                }
                let rules_path = base.join(file);
                let rules = fs::read_to_string(&rules_path).map_err(|e| {
                    let message = format!("policy '{}': {}: {e}", entry.name, rules_path.display());
                    Error::manifest(path, message)
                })?;
                entry.rules = Some(rules);
            }
        }

        manifest
            .validate()
            .map_err(|message| Error::manifest(path, message))?;
        tracing::debug!(
            ?path,
            policies = manifest.policies.len(),
            tokens = manifest.tokens.len(),
            "Loaded ACL manifest"
        );
        Ok(manifest)
    }

    /// Check names, uniqueness and required fields
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for entry in &self.policies {
            if !ACL_NAME.is_match(&entry.name) {
                return Err(format!(
                    "invalid policy name '{}' (letters, digits, '-' and '_', at most 128)",
                    entry.name
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(format!("policy '{}' declared more than once", entry.name));
            }
            if entry.state == EntryState::Present && entry.rules.is_none() {
                return Err(format!("policy '{}' has no rules", entry.name));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.tokens {
            if entry.name.trim().is_empty() {
                return Err("token name must not be empty".to_string());
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(format!("token '{}' declared more than once", entry.name));
            }
            if entry.state == EntryState::Present
                && entry.secret.is_none()
                && entry.secret_env.is_none()
            {
                return Err(format!("token '{}' needs secret or secret_env", entry.name));
            }
            if entry.secret.is_some() && entry.secret_env.is_some() {
                return Err(format!("token '{}' sets both secret and secret_env", entry.name));
            }
            if let Some(bad) = entry
                .policies
                .iter()
                .chain(&entry.roles)
                .find(|n| !ACL_NAME.is_match(n))
            {
                return Err(format!("token '{}' links invalid name '{bad}'", entry.name));
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.tokens.is_empty()
    }
}
