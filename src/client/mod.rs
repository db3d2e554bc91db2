//! Target store client and authentication.
//!
//! This module provides the [`TargetStore`] seam the loader writes through,
//! the [`RestStore`] implementation for PostgREST-style HTTP stores, and the
//! [`Credential`] used to authenticate against it.

mod auth;
mod rest;
mod store;

pub use auth::Credential;
pub use rest::{AccessTable, RestStore};
pub use store::{StoreError, TargetStore};
