//! Key requirement transformer
//!
//! Records that cannot be deduplicated are never uploaded.

use crate::etl::Transformer;
use crate::record::{Scalar, Table};
use eyre::Result;

/// Transformer that drops records without a usable deduplication key
///
/// A table where no record carries the key column at all is emptied.
pub struct KeyRequired {
    column: String,
}

impl KeyRequired {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Transformer for KeyRequired {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        if input.is_empty() {
            return Ok(input);
        }

        if !input.records.iter().any(|r| r.contains_key(&self.column)) {
            log::error!(
                "Column '{}' not found in {}, skipping {} record(s)",
                self.column,
                input.name,
                input.len()
            );
            input.records.clear();
            return Ok(input);
        }

        let before = input.len();
        input
            .records
            .retain(|r| r.get(&self.column).and_then(Scalar::as_key).is_some());
        let dropped = before - input.len();

        if dropped > 0 {
            log::warn!(
                "Dropped {} record(s) without '{}' from {}",
                dropped,
                self.column,
                input.name
            );
        }
        log::info!("{} valid record(s) for {}", input.len(), input.name);

        Ok(input)
    }
}
