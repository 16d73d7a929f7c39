//! Reconciliation outcomes

use acl_client::ChangeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of ACL object a result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Policy,
    Token,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Policy => f.write_str("policy"),
            ObjectKind::Token => f.write_str("token"),
        }
    }
}

/// Outcome of reconciling one object
///
/// `result` is `Some(true)` on success, `Some(false)` on failure and `None`
/// when a dry run found something that would change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResult {
    pub kind: ObjectKind,
    pub name: String,
    pub result: Option<bool>,
    pub changes: ChangeRecord,
    pub comment: String,
}

impl StateResult {
    /// Successful result with no changes
    pub fn unchanged(kind: ObjectKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            result: Some(true),
            changes: ChangeRecord::new(),
            comment: String::new(),
        }
    }

    /// Successful result carrying applied changes
    pub fn applied(kind: ObjectKind, name: &str, changes: ChangeRecord, comment: String) -> Self {
        Self {
            kind,
            name: name.to_string(),
            result: Some(true),
            changes,
            comment,
        }
    }

    /// Dry-run result describing a pending change
    pub fn pending(kind: ObjectKind, name: &str, changes: ChangeRecord, comment: String) -> Self {
        Self {
            kind,
            name: name.to_string(),
            result: None,
            changes,
            comment,
        }
    }

    /// Failed result
    pub fn failed(kind: ObjectKind, name: &str, comment: String) -> Self {
        Self {
            kind,
            name: name.to_string(),
            result: Some(false),
            changes: ChangeRecord::new(),
            comment,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.result == Some(false)
    }

    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    /// Whether anything changed or would change
    pub fn is_changed(&self) -> bool {
        self.is_pending() || (!self.is_failure() && !self.changes.is_empty())
    }
}

/// Results of applying a whole manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub results: Vec<StateResult>,
}

impl ApplyReport {
    /// Whether no result failed
    pub fn success(&self) -> bool {
        !self.results.iter().any(StateResult::is_failure)
    }

    pub fn changed(&self) -> usize {
        self.results.iter().filter(|r| r.is_changed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Whether a dry run found drift
    pub fn has_drift(&self) -> bool {
        self.results.iter().any(StateResult::is_pending)
    }
}
