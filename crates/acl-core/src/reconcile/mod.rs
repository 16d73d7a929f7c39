//! Reconciliation of desired ACL state
//!
//! - **outcome**: per-object [`StateResult`] and whole-run [`ApplyReport`]
//! - **reconciler**: dry-run and apply for policies and tokens

mod outcome;
mod reconciler;

pub use outcome::{ApplyReport, ObjectKind, StateResult};
pub use reconciler::{ReconcileOptions, Reconciler};
