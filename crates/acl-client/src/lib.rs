//! Consul ACL client
//!
//! Layer 0 of the workspace: everything that talks HTTP to Consul.
//!
//! - **Session**: [`ConnectionParams`] resolution, [`ConsulClient`] and the
//!   [`ClientCache`] memo
//! - **Policies**: [`policy`] repository (list, find, upsert, remove)
//! - **Tokens**: [`token`] repository with name-derived accessors
//!
//! Repositories take any [`AclTransport`], so they run unchanged against a
//! live agent or an in-memory fake.
//!
//! # Example
//!
//! ```no_run
//! use acl_client::{ConnectionParams, ConsulClient, ConsulSettings, policy};
//!
//! let params = ConnectionParams::resolve(None, None, &ConsulSettings::default());
//! let client = ConsulClient::new(&params)?;
//! let rules = "key_prefix \"\" { policy = \"read\" }";
//! let (created, changes) = policy::upsert(&client, "readonly", rules, None)?;
//! println!("created={created} changed={}", changes.len());
//! # Ok::<(), acl_client::Error>(())
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod model;
pub mod params;
pub mod policy;
pub mod token;

pub use cache::ClientCache;
pub use client::{AclTransport, ApiResponse, ConsulClient, Method, TOKEN_HEADER};
pub use error::{Error, Result};
pub use model::{Change, ChangeRecord, Link, Policy, REDACTED, Token, TokenSpec};
pub use params::{ConnectionParams, ConsulSettings, DEFAULT_HOST};
pub use token::accessor_from_name;
