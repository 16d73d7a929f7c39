//! Policy command implementations

use std::fs;
use std::path::Path;

use acl_client::policy;
use colored::Colorize;

use super::Session;
use super::output::{emit_result, print_json};
use crate::error::{CliError, Result};

/// Create or update a policy
pub fn run_policy_apply(
    session: &mut Session,
    name: &str,
    rules: Option<&str>,
    rules_file: Option<&Path>,
    description: Option<&str>,
) -> Result<()> {
    let rules = match (rules, rules_file) {
        (Some(rules), _) => rules.to_string(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            CliError::user(format!("Cannot read rules file {}: {e}", path.display()))
        })?,
        (None, None) => {
            return Err(CliError::user("Either --rules or --rules-file is required"));
        }
    };

    let result = session.context.manage_policy(
        name,
        description,
        &rules,
        session.host.as_deref(),
        session.token.as_deref(),
    );
    emit_result(&result, session.json)
}

/// Delete a policy if present
pub fn run_policy_delete(session: &mut Session, name: &str) -> Result<()> {
    let result = session
        .context
        .remove_policy(name, session.host.as_deref(), session.token.as_deref());
    emit_result(&result, session.json)
}

/// Print a policy as stored on the server
pub fn run_policy_show(session: &mut Session, name: &str) -> Result<()> {
    let client = session
        .context
        .client(session.host.as_deref(), session.token.as_deref())?;

    let Some(found) = policy::find_by_name(&*client, name)? else {
        return Err(CliError::user(format!("Policy {name} not found")));
    };

    if session.json {
        return print_json(&found);
    }

    println!("{} {}", "Policy".bold(), found.name.cyan());
    println!("   {}: {}", "id".dimmed(), found.id);
    if !found.description.is_empty() {
        println!("   {}: {}", "description".dimmed(), found.description);
    }
    println!();
    println!("{}", found.rules());
    Ok(())
}
