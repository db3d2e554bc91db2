//! Loader error taxonomy

use crate::client::StoreError;
use thiserror::Error;

/// Why a load (or one table of it) did not run to completion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    /// The target store could not be reached at all
    #[error("could not connect to target store: {0}")]
    Unreachable(#[source] StoreError),

    /// The principal is not a member of the tenant
    #[error("principal {principal_id} has no access to tenant {tenant_key}")]
    Unauthorized {
        tenant_key: String,
        principal_id: String,
    },

    /// The membership lookup itself was refused or unreadable
    #[error("could not verify access to tenant {tenant_key}: {source}")]
    AccessCheck {
        tenant_key: String,
        #[source]
        source: StoreError,
    },

    /// Scanning existing keys failed and the read error policy is `abort`
    #[error("failed to read existing keys from '{table}': {source}")]
    KeyRead {
        table: String,
        #[source]
        source: StoreError,
    },
}
