//! Memoized client construction
//!
//! Building a [`ConsulClient`] sets up a connection pool and a TLS config.
//! The cache only saves that work; it holds no server state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ConsulClient;
use crate::error::Result;
use crate::params::ConnectionParams;

/// Clients keyed by `(host, token)`
#[derive(Debug, Default)]
pub struct ClientCache {
    clients: HashMap<ConnectionParams, Arc<ConsulClient>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached client for `params`, building it on first use
    pub fn get_or_build(&mut self, params: &ConnectionParams) -> Result<Arc<ConsulClient>> {
        if let Some(client) = self.clients.get(params) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(ConsulClient::new(params)?);
        tracing::debug!(base_url = client.base_url(), "Built Consul client");
        self.clients.insert(params.clone(), Arc::clone(&client));
        Ok(client)
    }

    /// Drop the client for `params`; returns whether one was cached
    pub fn invalidate(&mut self, params: &ConnectionParams) -> bool {
        self.clients.remove(params).is_some()
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
