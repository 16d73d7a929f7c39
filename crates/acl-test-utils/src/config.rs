//! [`ConfigDir`] builder for settings and manifest fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory plus a separate global config directory.
///
/// # Example
///
/// ```rust,no_run
/// use acl_test_utils::ConfigDir;
///
/// let dir = ConfigDir::new();
/// dir.write_project_config("[consul]\nhost = \"http://consul:8500\"\n");
/// let manifest = dir.write_file("acl.toml", "[[policies]]\nname = \"readonly\"\nrules = \"\"\n");
/// assert!(manifest.exists());
/// ```
pub struct ConfigDir {
    project: TempDir,
    global: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    pub fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            global: TempDir::new().unwrap(),
        }
    }

    /// Project root (holds `.consul-acl/`)
    pub fn root(&self) -> &Path {
        self.project.path()
    }

    /// Stand-in for the user's global config directory
    pub fn global_dir(&self) -> &Path {
        self.global.path()
    }

    /// Write `<global>/config.toml`
    pub fn write_global_config(&self, content: &str) -> PathBuf {
        let path = self.global_dir().join("config.toml");
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_global_config: {}: {e}", path.display()));
        path
    }

    /// Write `.consul-acl/config.toml`
    pub fn write_project_config(&self, content: &str) -> PathBuf {
        self.write_file(".consul-acl/config.toml", content)
    }

    /// Write `.consul-acl/config.local.toml`
    pub fn write_local_config(&self, content: &str) -> PathBuf {
        self.write_file(".consul-acl/config.local.toml", content)
    }

    /// Write `content` to `relative` under the project root, creating parents
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_file: {}: {e}", parent.display()));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("write_file: {}: {e}", path.display()));
        path
    }
}
