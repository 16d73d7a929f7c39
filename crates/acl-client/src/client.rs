//! HTTP transport for the Consul ACL API
//!
//! Repositories talk to Consul through the [`AclTransport`] trait. Paths are
//! always relative to the API root (`acl/policies`, `acl/token/<id>`); the
//! transport owns the base URL and authentication.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::params::ConnectionParams;

/// Header carrying the ACL token on every request
pub const TOKEN_HEADER: &str = "X-Consul-Token";

const API_PATH: &str = "/v1/";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP methods used by the ACL endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    /// Whether a request with this method changes server state
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A fully-read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a 200 response with a JSON body
    pub fn ok_json(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Turn a non-2xx response into [`Error::Transport`]
    pub fn error_for_status(self, method: Method, path: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Transport {
                method: method.to_string(),
                path: path.to_string(),
                status: self.status,
                body: self.body.trim().to_string(),
            })
        }
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Something that can execute requests against the ACL API
pub trait AclTransport {
    /// Execute one request; `path` is relative to the API root
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse>;

    fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::Get, path, None)
    }

    fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::Put, path, Some(body))
    }

    fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::Delete, path, None)
    }
}

/// Blocking HTTP client bound to one Consul agent
pub struct ConsulClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl fmt::Debug for ConsulClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ConsulClient {
    /// Build a client for the given connection parameters
    ///
    /// # Errors
    ///
    /// Returns an error when the host is not a valid http(s) URL, the token
    /// cannot be sent as a header, or the HTTP client cannot be initialized.
    pub fn new(params: &ConnectionParams) -> Result<Self> {
        let base_url = base_url(params.host())?;

        let mut headers = HeaderMap::new();
        if let Some(token) = params.token().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(token).map_err(|_| {
                Error::argument("ACL token contains characters not allowed in a header")
            })?;
            value.set_sensitive(true);
            headers.insert(TOKEN_HEADER, value);
        }

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { base_url, http })
    }

    /// The API root every request path is joined onto
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl AclTransport for ConsulClient {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        let mut request = match method {
            Method::Get => self.http.get(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        tracing::debug!(%method, %path, status, "Consul API call");

        Ok(ApiResponse { status, body })
    }
}

/// Normalize a host into the API base URL
///
/// Trailing slashes collapse to one and `v1/` is appended unless the host
/// already contains `/v1/`.
pub fn base_url(host: &str) -> Result<String> {
    let mut base = host.trim_end_matches('/').to_string();
    base.push('/');
    if !base.contains(API_PATH) {
        base.push_str("v1/");
    }

    let parsed = reqwest::Url::parse(&base).map_err(|e| Error::InvalidUrl {
        host: host.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            host: host.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(base)
}
