//! Shared test utilities for the consul-acl workspace.
//!
//! This crate is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fake`]: [`FakeConsul`], an in-memory ACL API behind `AclTransport`
//! - [`config`]: [`ConfigDir`] builder for settings and manifest files

pub mod config;
pub mod fake;

pub use config::ConfigDir;
pub use fake::{FakeConsul, RecordedRequest};
