//! Error types for acl-core

use std::path::PathBuf;

/// Result type for acl-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in acl-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Manifest could not be loaded or failed validation
    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    /// A token's secret could not be determined
    #[error("Secret for token '{token}': {message}")]
    Secret { token: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Error from acl-client
    #[error(transparent)]
    Client(#[from] acl_client::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            path: path.into(),
            message: message.into(),
        }
    }
}
