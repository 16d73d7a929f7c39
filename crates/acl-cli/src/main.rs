//! Consul ACL manager CLI
//!
//! The command-line interface for reconciling Consul ACL policies and tokens.

mod cli;
mod commands;
mod error;

use acl_client::TokenSpec;
use acl_core::{AclContext, ReconcileOptions, SettingsResolver};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, PolicyAction, TokenAction};
use commands::Session;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Accessor derivation is local; no settings or server needed
    if let Commands::Token {
        action: TokenAction::Accessor { name },
    } = &cli.command
    {
        return commands::run_token_accessor(name, cli.json);
    }

    let cwd = std::env::current_dir()?;
    let mut resolver = SettingsResolver::new(&cwd);
    if let Some(ref path) = cli.config {
        resolver = resolver.with_explicit_file(path);
    }
    let settings = resolver.resolve()?;

    init_tracing(cli.verbose, settings.logging.level.as_deref())?;

    let dry_run = cli.dry_run || matches!(cli.command, Commands::Check { .. });
    let mut session = Session {
        context: AclContext::new(settings, ReconcileOptions { dry_run }),
        host: cli.host,
        token: cli.token,
        json: cli.json,
    };

    execute_command(&mut session, cli.command)
}

/// Install a stderr subscriber when verbose, `RUST_LOG` or `[logging] level` asks for one
fn init_tracing(verbose: bool, level: Option<&str>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if let Some(level) = level {
        EnvFilter::try_new(level)
            .map_err(|e| CliError::user(format!("Invalid logging level '{level}': {e}")))?
    } else {
        return Ok(());
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Verbose mode enabled");
    Ok(())
}

fn execute_command(session: &mut Session, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Policy { action } => match action {
            PolicyAction::Apply(args) => commands::run_policy_apply(
                session,
                &args.name,
                args.rules.as_deref(),
                args.rules_file.as_deref(),
                args.description.as_deref(),
            ),
            PolicyAction::Delete { name } => commands::run_policy_delete(session, &name),
            PolicyAction::Show { name } => commands::run_policy_show(session, &name),
        },
        Commands::Token { action } => match action {
            TokenAction::Apply(args) => {
                let spec = TokenSpec {
                    secret: args.secret,
                    description: args.description,
                    policies: args.policies,
                    roles: args.roles,
                };
                commands::run_token_apply(session, &args.name, &spec)
            }
            TokenAction::Delete { name } => commands::run_token_delete(session, &name),
            TokenAction::Accessor { name } => commands::run_token_accessor(&name, session.json),
        },
        Commands::Apply { manifest } => commands::run_apply(session, &manifest),
        Commands::Check { manifest } => commands::run_check(session, &manifest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn core_errors_pass_through_unchanged() {
        let inner = acl_client::Error::argument("name or accessor required");
        let error: CliError = acl_core::Error::from(inner).into();
        assert_eq!(error.to_string(), "Invalid arguments: name or accessor required");
    }
}
