//! Tenant stamping transformer
//!
//! Sets the ownership column on every record to the resolved tenant key.

use crate::etl::Transformer;
use crate::record::{Scalar, Table};
use eyre::Result;

/// Transformer that writes the tenant key into every record
///
/// Any value already present in the column is overwritten, so a file
/// exported for one tenant cannot be loaded under another's key.
///
/// # Example
/// ```
/// use tenant_loader::transform::TenantStamper;
/// use tenant_loader::etl::Transformer;
/// use tenant_loader::record::{Scalar, Table};
/// use tenant_loader::record;
///
/// let stamper = TenantStamper::new("confinamento_id", "tenant-1");
/// let table = Table::new("t", vec![record! { "unique_key" => "k" }]);
///
/// let output = stamper.transform(table).unwrap();
/// assert_eq!(output.records[0]["confinamento_id"], Scalar::from("tenant-1"));
/// ```
pub struct TenantStamper {
    column: String,
    tenant_key: String,
}

impl TenantStamper {
    pub fn new(column: impl Into<String>, tenant_key: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            tenant_key: tenant_key.into(),
        }
    }
}

impl Transformer for TenantStamper {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let mut overwritten = 0;
        for record in input.records.iter_mut() {
            let value = Scalar::Text(self.tenant_key.clone());
            if let Some(previous) = record.insert(self.column.clone(), value) {
                if previous != Scalar::Text(self.tenant_key.clone()) && !previous.is_missing() {
                    overwritten += 1;
                }
            }
        }

        if overwritten > 0 {
            log::warn!(
                "Overwrote {} {} value(s) in {} with {}",
                overwritten,
                self.column,
                input.name,
                self.tenant_key
            );
        } else {
            log::debug!("Set {} = {} for {}", self.column, self.tenant_key, input.name);
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_stamps_every_record() {
        let stamper = TenantStamper::new("confinamento_id", "t1");
        let table = Table::new(
            "a",
            vec![record! { "unique_key" => "k1" }, record! { "unique_key" => "k2" }],
        );
        let output = stamper.transform(table).unwrap();
        assert!(
            output
                .records
                .iter()
                .all(|r| r["confinamento_id"] == Scalar::from("t1"))
        );
    }

    #[test]
    fn test_overwrites_foreign_tenant() {
        let stamper = TenantStamper::new("confinamento_id", "t1");
        let table = Table::new("a", vec![record! { "confinamento_id" => "t2" }]);
        let output = stamper.transform(table).unwrap();
        assert_eq!(output.records[0]["confinamento_id"], Scalar::from("t1"));
    }
}
