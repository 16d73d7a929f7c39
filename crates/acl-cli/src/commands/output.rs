//! Human and JSON rendering of reconciliation results

use acl_core::{ApplyReport, StateResult};
use colored::Colorize;
use serde::Serialize;

use crate::error::{CliError, Result};

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn label(result: &StateResult) -> colored::ColoredString {
    if result.is_failure() {
        "ERROR".red().bold()
    } else if result.is_pending() {
        "PENDING".yellow().bold()
    } else if result.changes.is_empty() {
        "OK".green().bold()
    } else {
        "CHANGED".green().bold()
    }
}

/// Print one result with its changes
pub fn print_result(result: &StateResult) {
    let comment = if result.comment.is_empty() {
        "already in the desired state".dimmed().to_string()
    } else {
        result.comment.clone()
    };
    println!("{} {} {}: {}", label(result), result.kind, result.name.cyan(), comment);

    for (field, change) in result.changes.iter() {
        println!(
            "   {} {}: {} -> {}",
            "~".yellow(),
            field,
            change.old.to_string().dimmed(),
            change.new
        );
    }
}

/// Render a single result and fail when it failed
pub fn emit_result(result: &StateResult, json: bool) -> Result<()> {
    if json {
        print_json(result)?;
    } else {
        print_result(result);
    }

    if result.is_failure() {
        return Err(CliError::user(format!("{} {} failed", result.kind, result.name)));
    }
    Ok(())
}

/// Render a manifest report
pub fn emit_report(report: &ApplyReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    for result in &report.results {
        print_result(result);
    }
    println!();

    let summary = format!(
        "{} entries, {} changed, {} failed",
        report.results.len(),
        report.changed(),
        report.failed()
    );
    if report.success() {
        println!("{} {}", "OK".green().bold(), summary);
    } else {
        println!("{} {}", "ERROR".red().bold(), summary);
    }
    Ok(())
}
