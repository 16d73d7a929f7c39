//! Settings resolution and ACL manifests
//!
//! # Settings hierarchy
//!
//! Settings are loaded and merged from these sources (later sources override earlier):
//!
//! 1. **Global defaults** - `<config_dir>/consul-acl/config.toml`
//! 2. **Project settings** - `.consul-acl/config.toml`
//! 3. **Local overrides** - `.consul-acl/config.local.toml`
//!
//! Connection parameters resolved from settings still lose to explicit
//! arguments and win over `CONSUL_HTTP_*` environment variables.
//!
//! # Manifests
//!
//! An [`AclManifest`] declares the policies and tokens to reconcile, in TOML,
//! YAML or JSON.

mod manifest;
mod resolver;
mod settings;

pub use manifest::{AclManifest, EntryState, PolicyEntry, TokenEntry};
pub use resolver::SettingsResolver;
pub use settings::{LoggingSettings, Settings};
