//! ACL token repository
//!
//! Tokens are addressed by an accessor derived from a logical name, so the
//! same name always maps to the same token without any lookup state.

use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{AclTransport, Method};
use crate::error::{Error, Result};
use crate::model::{ChangeRecord, Link, REDACTED, Token, TokenSpec};

/// Namespace for accessor derivation. Changing it re-addresses every token.
pub const ACCESSOR_NAMESPACE: Uuid = Uuid::from_u128(0x3f1d_9a52_6c0e_4b7a_8e21_c45d_07b9_e1a6);

const CREATE_PATH: &str = "acl/token";

fn token_path(accessor: &Uuid) -> String {
    format!("acl/token/{accessor}")
}

/// Derive the accessor for a logical token name (UUIDv5)
pub fn accessor_from_name(name: &str) -> Uuid {
    Uuid::new_v5(&ACCESSOR_NAMESPACE, name.as_bytes())
}

/// Sorted policy and role names linked from a token
pub fn link_names(token: &Token) -> (Vec<String>, Vec<String>) {
    (sorted_names(&token.policies), sorted_names(&token.roles))
}

fn sorted_names(links: &[Link]) -> Vec<String> {
    let mut names: Vec<String> = links.iter().map(|l| l.name.clone()).collect();
    names.sort();
    names
}

fn sorted(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort();
    names
}

fn links(names: &[String]) -> Vec<Link> {
    names.iter().map(Link::by_name).collect()
}

/// Look a token up by logical name or by accessor
///
/// When both are given the name wins. A 404 means the token does not exist.
///
/// # Errors
///
/// [`Error::Argument`] when neither is given; [`Error::Transport`] for any
/// other non-2xx response.
pub fn find_by_name_or_accessor(
    transport: &dyn AclTransport,
    name: Option<&str>,
    accessor: Option<Uuid>,
) -> Result<Option<Token>> {
    let accessor = match (name, accessor) {
        (Some(name), _) => accessor_from_name(name),
        (None, Some(accessor)) => accessor,
        (None, None) => {
            return Err(Error::argument(
                "either a token name or an accessor is required",
            ));
        }
    };

    let path = token_path(&accessor);
    let response = transport.get(&path)?;
    if response.is_not_found() {
        debug!(%accessor, "ACL token not found");
        return Ok(None);
    }

    let token = response.error_for_status(Method::Get, &path)?.json()?;
    Ok(Some(token))
}

/// Compare an existing token with the desired attributes
///
/// Link lists are compared as sorted name lists.
pub fn diff(
    existing: &Token,
    description: Option<&str>,
    policies: &[String],
    roles: &[String],
) -> ChangeRecord {
    let description = description.unwrap_or_default();
    let (old_policies, old_roles) = link_names(existing);
    let (new_policies, new_roles) = (sorted(policies), sorted(roles));

    let mut changes = ChangeRecord::new();
    if existing.description != description {
        changes.insert("description", existing.description.as_str(), description);
    }
    if old_policies != new_policies {
        changes.insert("policies", old_policies, new_policies);
    }
    if old_roles != new_roles {
        changes.insert("roles", old_roles, new_roles);
    }
    changes
}

/// Changes reported when the token for `name` is created
///
/// The secret is always recorded as [`REDACTED`].
pub fn creation_record(name: &str, spec: &TokenSpec) -> ChangeRecord {
    ChangeRecord::new()
        .with("accessor", "", accessor_from_name(name).to_string())
        .with("secret", "", REDACTED)
        .with("description", "", spec.description.as_deref().unwrap_or_default())
        .with("policies", "", sorted(&spec.policies))
        .with("roles", "", sorted(&spec.roles))
}

/// Changes reported when `existing` is deleted
pub fn removal_record(existing: &Token) -> ChangeRecord {
    let (policies, roles) = link_names(existing);
    ChangeRecord::new()
        .with("accessor", existing.accessor.to_string(), "")
        .with("description", existing.description.as_str(), "")
        .with("policies", policies, "")
        .with("roles", roles, "")
}

fn payload(accessor: &Uuid, spec: &TokenSpec) -> Value {
    json!({
        "AccessorID": accessor.to_string(),
        "SecretID": spec.secret,
        "Description": spec.description.as_deref().unwrap_or_default(),
        "Policies": links(&spec.policies),
        "Roles": links(&spec.roles),
    })
}

/// Create the token for `name`, or update its mutable attributes
///
/// # Errors
///
/// [`Error::Consistency`] when a token already exists under this name with a
/// different secret. No write is issued in that case.
pub fn upsert(
    transport: &dyn AclTransport,
    name: &str,
    spec: &TokenSpec,
) -> Result<(bool, ChangeRecord)> {
    let accessor = accessor_from_name(name);

    if let Some(existing) = find_by_name_or_accessor(transport, None, Some(accessor))? {
        if existing.secret.as_deref() != Some(spec.secret.as_str()) {
            return Err(Error::Consistency {
                accessor: accessor.to_string(),
                message: format!("secret of token '{name}' cannot be changed once created"),
            });
        }

        let changes = diff(
            &existing,
            spec.description.as_deref(),
            &spec.policies,
            &spec.roles,
        );
        if changes.is_empty() {
            debug!(token = name, %accessor, "ACL token up to date");
            return Ok((false, changes));
        }

        let path = token_path(&accessor);
        transport
            .put(&path, &payload(&accessor, spec))?
            .error_for_status(Method::Put, &path)?;
        info!(token = name, %accessor, fields = changes.len(), "Updated ACL token");
        return Ok((false, changes));
    }

    transport
        .put(CREATE_PATH, &payload(&accessor, spec))?
        .error_for_status(Method::Put, CREATE_PATH)?;
    info!(token = name, %accessor, "Created ACL token");

    Ok((true, creation_record(name, spec)))
}

/// Delete the token for `name` if it exists
pub fn remove(transport: &dyn AclTransport, name: &str) -> Result<ChangeRecord> {
    let Some(existing) = find_by_name_or_accessor(transport, Some(name), None)? else {
        debug!(token = name, "ACL token already absent");
        return Ok(ChangeRecord::new());
    };

    let path = token_path(&existing.accessor);
    transport
        .delete(&path)?
        .error_for_status(Method::Delete, &path)?;
    info!(token = name, accessor = %existing.accessor, "Deleted ACL token");

    Ok(removal_record(&existing))
}
