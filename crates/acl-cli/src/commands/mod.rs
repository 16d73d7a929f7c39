//! Command implementations for consul-acl

pub mod manifest;
pub mod output;
pub mod policy;
pub mod token;

pub use manifest::{run_apply, run_check};
pub use policy::{run_policy_apply, run_policy_delete, run_policy_show};
pub use token::{run_token_accessor, run_token_apply, run_token_delete};

use acl_core::AclContext;

/// Context plus the per-invocation connection overrides and output mode
pub struct Session {
    pub context: AclContext,
    pub host: Option<String>,
    pub token: Option<String>,
    pub json: bool,
}
