//! Error types for acl-client

/// Result type for acl-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the Consul ACL API
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-2xx status that is not handled as "absent"
    #[error("{method} {path} failed with HTTP {status}: {body}")]
    Transport {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller supplied an unusable combination of arguments
    #[error("Invalid arguments: {message}")]
    Argument { message: String },

    /// The requested change would violate an invariant of an existing object
    #[error("Token {accessor}: {message}")]
    Consistency { accessor: String, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured host does not form a usable base URL
    #[error("Invalid Consul address '{host}': {reason}")]
    InvalidUrl { host: String, reason: String },
}

impl Error {
    /// Create an argument error with the given message
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Whether this error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http(_))
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
