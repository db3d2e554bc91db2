//! Target store contract

use crate::record::Record;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a [`TargetStore`].
///
/// Callers branch on the variant: an unreachable store aborts a whole load,
/// a rejected request is scoped to the call that made it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Transport failure (DNS, TLS, connection refused, timeout)
    #[error("target store unreachable: {0}")]
    Unreachable(String),
    /// The store answered with a non-success status
    #[error("target store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// The request could not be built (bad table name, unjoinable URL)
    #[error("invalid target store request: {0}")]
    InvalidRequest(String),
    /// The store answered with a body that could not be decoded
    #[error("target store response could not be decoded: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

/// An external, durable, table-oriented store.
///
/// Only reads and inserts are exposed; the loader never updates or deletes.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Read `limit` rows starting at `offset`, projecting `columns`.
    ///
    /// Rows are returned in a stable order so consecutive windows do not
    /// overlap.
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    /// Insert all `records` into `table` as a single request
    async fn insert(&self, table: &str, records: &[Record]) -> Result<(), StoreError>;

    /// Check whether `principal_id` is a member of `tenant_key`
    async fn has_access(&self, tenant_key: &str, principal_id: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Rejected {
            status: 409,
            body: "duplicate key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "target store rejected request (409): duplicate key"
        );
        assert!(!err.is_unreachable());
        assert!(StoreError::Unreachable("refused".into()).is_unreachable());
        assert!(!StoreError::InvalidRequest("bad table".into()).is_unreachable());
    }
}
