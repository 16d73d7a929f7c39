//! Settings resolution with hierarchical merge
//!
//! The `SettingsResolver` loads and merges settings from multiple sources
//! in a defined hierarchy, with later sources overriding earlier ones.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Settings;

const APP_DIR: &str = "consul-acl";
const PROJECT_DIR: &str = ".consul-acl";

/// Resolves settings by merging multiple sources
///
/// 1. Global defaults (`<config_dir>/consul-acl/config.toml`)
/// 2. Project settings (`.consul-acl/config.toml`)
/// 3. Local overrides (`.consul-acl/config.local.toml`) - not committed
///
/// An explicit file replaces layers 2 and 3.
pub struct SettingsResolver {
    /// Project root directory
    root: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, the platform directory from `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,

    /// Explicit settings file given on the command line
    explicit_file: Option<PathBuf>,
}

impl SettingsResolver {
    /// Create a resolver for the given project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
            explicit_file: None,
        }
    }

    /// Use a custom global config directory instead of the platform one
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Read project settings from `path` only
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    /// Path of the project settings file
    pub fn project_config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.toml")
    }

    /// Path of the local overrides file
    pub fn local_config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.local.toml")
    }

    /// Resolve the settings by merging all sources
    ///
    /// Missing layers are skipped, except an explicit file, which must exist.
    /// Invalid TOML in any layer is an error.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(global_dir) = self.global_config_dir() {
            let path = global_dir.join("config.toml");
            if path.is_file() {
                tracing::debug!(?path, "Loading global settings (layer 1)");
                settings.merge(&load(&path)?);
            } else {
                tracing::debug!(?path, "No global settings found (layer 1)");
            }
        }

        if let Some(ref explicit) = self.explicit_file {
            if !explicit.is_file() {
                return Err(Error::ConfigNotFound {
                    path: explicit.clone(),
                });
            }
            tracing::debug!(path = ?explicit, "Loading explicit settings");
            settings.merge(&load(explicit)?);
            return Ok(settings);
        }

        let project = self.project_config_path();
        if project.is_file() {
            tracing::debug!(path = ?project, "Loading project settings (layer 2)");
            settings.merge(&load(&project)?);
        }

        let local = self.local_config_path();
        if local.is_file() {
            tracing::debug!(path = ?local, "Loading local overrides (layer 3)");
            settings.merge(&load(&local)?);
        }

        Ok(settings)
    }

    /// Get the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a project settings file exists
    pub fn has_config(&self) -> bool {
        self.project_config_path().is_file()
    }
}

fn load(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    Settings::parse(&content)
}
