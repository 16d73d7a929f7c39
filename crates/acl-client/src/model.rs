//! ACL objects as exchanged with Consul, and change records

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Placeholder recorded instead of secret values
pub const REDACTED: &str = "<redacted>";

/// An ACL policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Server-assigned identifier
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    /// Empty when the policy has no description
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Rule source; absent on policy stubs returned by the list endpoint
    #[serde(rename = "Rules", default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
}

impl Policy {
    pub fn rules(&self) -> &str {
        self.rules.as_deref().unwrap_or_default()
    }
}

/// A reference from a token to a policy or role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Name")]
    pub name: String,
}

impl Link {
    /// A link addressed by name only, as sent on create/update
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// An ACL token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "AccessorID")]
    pub accessor: Uuid,

    /// Only returned to callers allowed to read secrets
    #[serde(rename = "SecretID", default)]
    pub secret: Option<String>,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Policies", default, deserialize_with = "null_as_empty")]
    pub policies: Vec<Link>,

    #[serde(rename = "Roles", default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Link>,
}

/// Desired attributes of a token
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    /// Secret presented by clients; fixed once the token exists
    pub secret: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Linked policy names
    #[serde(default)]
    pub policies: Vec<String>,

    /// Linked role names
    #[serde(default)]
    pub roles: Vec<String>,
}

impl std::fmt::Debug for TokenSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSpec")
            .field("secret", &REDACTED)
            .field("description", &self.description)
            .field("policies", &self.policies)
            .field("roles", &self.roles)
            .finish()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Link>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Link>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One field transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub old: Value,
    pub new: Value,
}

/// Field name to transition; empty means nothing changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRecord(BTreeMap<String, Change>);

impl ChangeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition for `field`
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        old: impl Into<Value>,
        new: impl Into<Value>,
    ) {
        self.0.insert(
            field.into(),
            Change {
                old: old.into(),
                new: new.into(),
            },
        );
    }

    /// Builder form of [`ChangeRecord::insert`]
    pub fn with(
        mut self,
        field: impl Into<String>,
        old: impl Into<Value>,
        new: impl Into<Value>,
    ) -> Self {
        self.insert(field, old, new);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Change> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Changed field names in sorted order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
