//! Reconciliation layer for declarative Consul ACL management
//!
//! This crate sits between `acl-client` and the CLI:
//!
//! - **Settings resolution**: layered merge of global, project and local settings
//! - **Manifests**: policies and tokens declared in TOML, YAML or JSON
//! - **Reconciler**: create, update, delete or leave alone, with a dry-run mode
//! - **AclContext**: explicit settings, options and client cache for entry points
//!
//! ```text
//!        CLI
//!         |
//!     acl-core
//!         |
//!    acl-client
//!         |
//!   Consul ACL API
//! ```
//!
//! # Example
//!
//! ```no_run
//! use acl_core::{AclContext, ReconcileOptions, SettingsResolver};
//!
//! let settings = SettingsResolver::new(".").resolve()?;
//! let mut ctx = AclContext::new(settings, ReconcileOptions { dry_run: true });
//! let rules = "key_prefix \"\" { policy = \"read\" }";
//! let result = ctx.manage_policy("readonly", Some("RO access"), rules, None, None);
//! println!("{}", result.comment);
//! # Ok::<(), acl_core::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod reconcile;

pub use config::{AclManifest, EntryState, PolicyEntry, Settings, SettingsResolver, TokenEntry};
pub use context::AclContext;
pub use error::{Error, Result};
pub use reconcile::{ApplyReport, ObjectKind, ReconcileOptions, Reconciler, StateResult};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_config_not_found_displays_path() {
        let error = Error::ConfigNotFound {
            path: PathBuf::from("/etc/consul-acl/config.toml"),
        };
        let display = error.to_string();
        assert!(
            display.contains("/etc/consul-acl/config.toml"),
            "Error display should contain the path, got: {display}"
        );
    }

    #[test]
    fn client_errors_pass_through_transparently() {
        let error = Error::from(acl_client::Error::argument("missing name"));
        assert_eq!(error.to_string(), "Invalid arguments: missing name");
    }
}
