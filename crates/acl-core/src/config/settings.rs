//! Settings parsed from a single `config.toml`
//!
//! Multiple layers are merged by [`super::SettingsResolver`].

use crate::Result;
use acl_client::ConsulSettings;
use serde::{Deserialize, Serialize};

/// Logging section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, e.g. `"info"` or `"acl_client=debug"`
    #[serde(default)]
    pub level: Option<String>,
}

/// Tool settings
///
/// ```toml
/// [consul]
/// host = "https://consul.internal:8501"
/// token = "..."
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub consul: ConsulSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Parse settings from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use acl_core::config::Settings;
    ///
    /// let settings = Settings::parse(r#"
    /// [consul]
    /// host = "http://consul:8500"
    /// "#).unwrap();
    ///
    /// assert_eq!(settings.consul.host.as_deref(), Some("http://consul:8500"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Merge another layer into this one; set values in `other` win
    pub fn merge(&mut self, other: &Settings) {
        self.consul.merge(&other.consul);
        if other.logging.level.is_some() {
            self.logging.level.clone_from(&other.logging.level);
        }
    }
}
