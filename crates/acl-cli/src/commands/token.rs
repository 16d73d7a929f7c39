//! Token command implementations

use acl_client::{TokenSpec, accessor_from_name};
use serde_json::json;

use super::Session;
use super::output::{emit_result, print_json};
use crate::error::Result;

/// Create or update the token for `name`
pub fn run_token_apply(session: &mut Session, name: &str, spec: &TokenSpec) -> Result<()> {
    let result = session.context.manage_token(
        name,
        spec,
        session.host.as_deref(),
        session.token.as_deref(),
    );
    emit_result(&result, session.json)
}

/// Delete the token for `name` if present
pub fn run_token_delete(session: &mut Session, name: &str) -> Result<()> {
    let result = session
        .context
        .remove_token(name, session.host.as_deref(), session.token.as_deref());
    emit_result(&result, session.json)
}

/// Print the accessor derived from `name`; needs no server
pub fn run_token_accessor(name: &str, json: bool) -> Result<()> {
    let accessor = accessor_from_name(name);
    if json {
        return print_json(&json!({ "name": name, "accessor": accessor }));
    }
    println!("{accessor}");
    Ok(())
}
