//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// Consul ACL manager - Keep Consul ACL policies and tokens in a declared state
#[derive(Parser, Debug)]
#[command(name = "consul-acl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Consul agent address (falls back to CONSUL_HTTP_ADDR)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Management token (falls back to CONSUL_HTTP_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Settings file replacing .consul-acl/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage a single ACL policy
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Manage a single ACL token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Reconcile every entry of a manifest
    ///
    /// Examples:
    ///   consul-acl apply acl.toml
    ///   consul-acl apply acl.yaml --dry-run
    Apply {
        /// Manifest file (.toml, .yaml, .yml or .json)
        manifest: PathBuf,
    },

    /// Check a manifest for drift without changing anything
    ///
    /// Exits non-zero when any entry would change or fails.
    Check {
        /// Manifest file (.toml, .yaml, .yml or .json)
        manifest: PathBuf,
    },
}

/// Policy subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PolicyAction {
    /// Create or update a policy
    Apply(PolicyApplyArgs),

    /// Delete a policy if it exists
    Delete {
        /// Policy name
        name: String,
    },

    /// Print a policy as stored on the server
    Show {
        /// Policy name
        name: String,
    },
}

/// Arguments for `policy apply`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(group(ArgGroup::new("source").required(true).args(["rules", "rules_file"])))]
pub struct PolicyApplyArgs {
    /// Policy name
    pub name: String,

    /// Rule source text
    #[arg(long)]
    pub rules: Option<String>,

    /// File holding the rule source
    #[arg(long, value_name = "FILE")]
    pub rules_file: Option<PathBuf>,

    /// Human-readable description
    #[arg(long)]
    pub description: Option<String>,
}

/// Token subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
    /// Create or update the token for a name
    Apply(TokenApplyArgs),

    /// Delete the token for a name if it exists
    Delete {
        /// Token name
        name: String,
    },

    /// Print the accessor ID derived from a name
    Accessor {
        /// Token name
        name: String,
    },
}

/// Arguments for `token apply`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TokenApplyArgs {
    /// Token name
    pub name: String,

    /// Secret ID; fixed once the token exists
    #[arg(long, env = "CONSUL_ACL_TOKEN_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Human-readable description
    #[arg(long)]
    pub description: Option<String>,

    /// Policy to link (repeatable)
    #[arg(long = "policy", value_name = "NAME")]
    pub policies: Vec<String>,

    /// Role to link (repeatable)
    #[arg(long = "role", value_name = "NAME")]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "consul-acl",
            "apply",
            "acl.toml",
            "--dry-run",
            "--host",
            "http://c:8500",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.host.as_deref(), Some("http://c:8500"));
        assert_eq!(
            cli.command,
            Commands::Apply {
                manifest: PathBuf::from("acl.toml")
            }
        );
    }

    #[test]
    fn policy_apply_requires_a_rule_source() {
        assert!(Cli::try_parse_from(["consul-acl", "policy", "apply", "readonly"]).is_err());
        let both = [
            "consul-acl",
            "policy",
            "apply",
            "readonly",
            "--rules",
            "x",
            "--rules-file",
            "y",
        ];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn token_apply_collects_links() {
        let cli = Cli::try_parse_from([
            "consul-acl",
            "token",
            "apply",
            "ci",
            "--secret",
            "s",
            "--policy",
            "a",
            "--policy",
            "b",
            "--role",
            "r",
        ])
        .unwrap();
        match cli.command {
            Commands::Token {
                action: TokenAction::Apply(args),
            } => {
                assert_eq!(args.policies, vec!["a", "b"]);
                assert_eq!(args.roles, vec!["r"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
