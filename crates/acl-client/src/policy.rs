//! ACL policy repository
//!
//! Policies are addressed by name from the caller's side but by server-assigned
//! ID on the wire, so every mutation starts with a name lookup over the full
//! policy list.

use serde_json::json;
use tracing::{debug, info};

use crate::client::{AclTransport, Method};
use crate::error::Result;
use crate::model::{ChangeRecord, Policy};

const LIST_PATH: &str = "acl/policies";
const CREATE_PATH: &str = "acl/policy";

fn policy_path(id: &str) -> String {
    format!("acl/policy/{id}")
}

/// Fetch every policy known to the server
pub fn list_all(transport: &dyn AclTransport) -> Result<Vec<Policy>> {
    let policies: Vec<Policy> = transport
        .get(LIST_PATH)?
        .error_for_status(Method::Get, LIST_PATH)?
        .json()?;
    debug!(count = policies.len(), "Listed ACL policies");
    Ok(policies)
}

/// Fetch one policy by ID
pub fn read(transport: &dyn AclTransport, id: &str) -> Result<Policy> {
    let path = policy_path(id);
    transport
        .get(&path)?
        .error_for_status(Method::Get, &path)?
        .json()
}

/// Find a policy by exact name
///
/// The last match wins if the server ever returns duplicates. List entries
/// without rules are completed with a read by ID.
pub fn find_by_name(transport: &dyn AclTransport, name: &str) -> Result<Option<Policy>> {
    let found = list_all(transport)?
        .into_iter()
        .filter(|p| p.name == name)
        .last();

    match found {
        Some(stub) if stub.rules.is_none() => {
            debug!(policy = name, id = %stub.id, "Reading full policy");
            read(transport, &stub.id).map(Some)
        }
        other => Ok(other),
    }
}

/// Compare an existing policy with the desired attributes
///
/// A missing description is the same as an empty one.
pub fn diff(existing: &Policy, name: &str, rules: &str, description: Option<&str>) -> ChangeRecord {
    let description = description.unwrap_or_default();
    let mut changes = ChangeRecord::new();

    if existing.rules() != rules {
        changes.insert("rules", existing.rules(), rules);
    }
    if existing.description != description {
        changes.insert("description", existing.description.as_str(), description);
    }
    if existing.name != name {
        changes.insert("name", existing.name.as_str(), name);
    }

    changes
}

/// Changes reported when a policy is created
pub fn creation_record(name: &str, rules: &str, description: Option<&str>) -> ChangeRecord {
    ChangeRecord::new()
        .with("name", "", name)
        .with("rules", "", rules)
        .with("description", "", description.unwrap_or_default())
}

/// Changes reported when `existing` is deleted
pub fn removal_record(existing: &Policy) -> ChangeRecord {
    ChangeRecord::new()
        .with("id", existing.id.as_str(), "")
        .with("name", existing.name.as_str(), "")
        .with("description", existing.description.as_str(), "")
        .with("rules", existing.rules(), "")
}

/// Create the policy, or update it in place when it differs
///
/// Returns whether the policy was created and the fields that changed.
pub fn upsert(
    transport: &dyn AclTransport,
    name: &str,
    rules: &str,
    description: Option<&str>,
) -> Result<(bool, ChangeRecord)> {
    let payload = json!({
        "Name": name,
        "Description": description.unwrap_or_default(),
        "Rules": rules,
    });

    let Some(existing) = find_by_name(transport, name)? else {
        transport
            .put(CREATE_PATH, &payload)?
            .error_for_status(Method::Put, CREATE_PATH)?;
        info!(policy = name, "Created ACL policy");

        return Ok((true, creation_record(name, rules, description)));
    };

    let changes = diff(&existing, name, rules, description);
    if changes.is_empty() {
        debug!(policy = name, "ACL policy up to date");
        return Ok((false, changes));
    }

    let path = policy_path(&existing.id);
    transport
        .put(&path, &payload)?
        .error_for_status(Method::Put, &path)?;
    info!(policy = name, id = %existing.id, fields = changes.len(), "Updated ACL policy");

    Ok((false, changes))
}

/// Delete the policy with this name if it exists
pub fn remove(transport: &dyn AclTransport, name: &str) -> Result<ChangeRecord> {
    let Some(existing) = find_by_name(transport, name)? else {
        debug!(policy = name, "ACL policy already absent");
        return Ok(ChangeRecord::new());
    };

    let path = policy_path(&existing.id);
    transport
        .delete(&path)?
        .error_for_status(Method::Delete, &path)?;
    info!(policy = name, id = %existing.id, "Deleted ACL policy");

    Ok(removal_record(&existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn existing() -> Policy {
        Policy {
            id: "8f246b77-f3e1-ff88-5b48-8ec93abf3e05".to_string(),
            name: "readonly".to_string(),
            description: "RO access".to_string(),
            rules: Some("key_prefix \"\" { policy = \"read\" }".to_string()),
        }
    }

    #[test]
    fn diff_is_empty_when_attributes_match() {
        let p = existing();
        assert!(diff(&p, "readonly", p.rules(), Some("RO access")).is_empty());
    }

    #[test]
    fn diff_reports_only_rules() {
        let p = existing();
        let rules = "node_prefix \"\" { policy = \"read\" }";
        let changes = diff(&p, "readonly", rules, Some("RO access"));
        assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["rules"]);
        assert_eq!(changes.get("rules").unwrap().old, p.rules());
    }

    #[test]
    fn diff_treats_missing_description_as_empty() {
        let mut p = existing();
        p.description = String::new();
        assert!(diff(&p, "readonly", p.rules(), None).is_empty());

        let changes = diff(&existing(), "readonly", existing().rules(), None);
        assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["description"]);
        assert_eq!(changes.get("description").unwrap().new, "");
    }

    #[test]
    fn removal_record_clears_identity_and_content() {
        let p = existing();
        let changes = removal_record(&p);
        assert_eq!(
            changes.fields().collect::<Vec<_>>(),
            vec!["description", "id", "name", "rules"]
        );
        assert_eq!(changes.get("id").unwrap().old, p.id.as_str());
        assert_eq!(changes.get("rules").unwrap().new, "");
    }
}
