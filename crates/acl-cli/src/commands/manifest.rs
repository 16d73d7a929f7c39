//! Manifest apply and check commands

use std::path::Path;

use acl_core::{AclManifest, ApplyReport};
use colored::Colorize;

use super::Session;
use super::output::emit_report;
use crate::error::{CliError, Result};

fn reconcile(session: &mut Session, path: &Path, verb: &str) -> Result<ApplyReport> {
    let manifest = AclManifest::load(path)?;
    if !session.json {
        println!("{} {verb} {}...", "=>".blue().bold(), path.display());
    }

    let report = session
        .context
        .apply_manifest(&manifest, session.host.as_deref(), session.token.as_deref())?;
    emit_report(&report, session.json)?;

    if !report.success() {
        return Err(CliError::user(format!(
            "{} of {} entries failed",
            report.failed(),
            report.results.len()
        )));
    }
    Ok(report)
}

/// Reconcile every entry of the manifest at `path`
pub fn run_apply(session: &mut Session, path: &Path) -> Result<()> {
    let verb = if session.context.options().dry_run {
        "Planning"
    } else {
        "Applying"
    };
    reconcile(session, path, verb).map(|_| ())
}

/// Dry-run the manifest and fail when anything would change
///
/// The session must have been built with `dry_run` set.
pub fn run_check(session: &mut Session, path: &Path) -> Result<()> {
    let report = reconcile(session, path, "Checking")?;
    if report.has_drift() {
        if !session.json {
            println!();
            println!("Run {} to repair.", format!("consul-acl apply {}", path.display()).cyan());
        }
        return Err(CliError::user(format!("{} entries have drifted", report.changed())));
    }
    Ok(())
}
