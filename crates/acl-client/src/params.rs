//! Connection parameter resolution
//!
//! The Consul address and ACL token are resolved from, in order:
//!
//! 1. Explicit arguments
//! 2. The `[consul]` section of the resolved settings
//! 3. `CONSUL_HTTP_ADDR` / `CONSUL_HTTP_SSL` / `CONSUL_HTTP_TOKEN`
//! 4. Defaults: `http://127.0.0.1:8500` and no token

use serde::{Deserialize, Serialize};

/// Address used when nothing else is configured
pub const DEFAULT_HOST: &str = "http://127.0.0.1:8500";

pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_HTTP_SSL: &str = "CONSUL_HTTP_SSL";
pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";

/// The `[consul]` configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulSettings {
    /// Consul agent address, e.g. `https://consul.internal:8501`
    #[serde(default)]
    pub host: Option<String>,

    /// ACL token presented as `X-Consul-Token`
    #[serde(default)]
    pub token: Option<String>,
}

impl ConsulSettings {
    /// Overlay `other` on top of this section; set values in `other` win
    pub fn merge(&mut self, other: &ConsulSettings) {
        if other.host.is_some() {
            self.host.clone_from(&other.host);
        }
        if other.token.is_some() {
            self.token.clone_from(&other.token);
        }
    }
}

/// Resolved connection parameters for one session
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionParams {
    host: String,
    token: Option<String>,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectionParams {
    /// Build parameters directly, bypassing resolution
    pub fn new(host: impl Into<String>, token: Option<String>) -> Self {
        Self {
            host: host.into(),
            token,
        }
    }

    /// Resolve parameters using the process environment
    pub fn resolve(
        host: Option<&str>,
        token: Option<&str>,
        settings: &ConsulSettings,
    ) -> Self {
        Self::resolve_with_env(host, token, settings, |key| std::env::var(key).ok())
    }

    /// Resolve parameters with an explicit environment lookup
    pub fn resolve_with_env<F>(
        host: Option<&str>,
        token: Option<&str>,
        settings: &ConsulSettings,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = host
            .map(str::to_string)
            .or_else(|| settings.host.clone())
            .or_else(|| {
                env(ENV_HTTP_ADDR).map(|addr| {
                    if addr.contains("://") {
                        addr
                    } else {
                        let scheme = if ssl_enabled(env(ENV_HTTP_SSL).as_deref()) {
                            "https"
                        } else {
                            "http"
                        };
                        format!("{scheme}://{addr}")
                    }
                })
            })
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let token = token
            .map(str::to_string)
            .or_else(|| settings.token.clone())
            .or_else(|| env(ENV_HTTP_TOKEN));

        tracing::debug!(%host, has_token = token.is_some(), "Resolved Consul connection");

        Self { host, token }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Interpret `CONSUL_HTTP_SSL`: unset, empty, `0`, `false` and `f` mean plain HTTP
fn ssl_enabled(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) if v.is_empty() => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "f"),
    }
}
