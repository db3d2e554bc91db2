//! Batched insertion with per-record fallback
//!
//! Two phases per batch: attempt one bulk insert; if the store refuses it,
//! insert the batch's records one by one and collect the ones that fail.

use super::RecordFailure;
use crate::client::TargetStore;
use crate::record::{Record, Scalar};
use owo_colors::OwoColorize;

/// Result of inserting a list of records in batches
#[derive(Debug, Default, PartialEq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub failures: Vec<RecordFailure>,
}

/// Insert `records` into `table`, at most `batch_size` per insert call.
pub async fn insert_batches<S: TargetStore + ?Sized>(
    store: &S,
    table: &str,
    records: &[Record],
    batch_size: usize,
    key_column: &str,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let total = records.len().div_ceil(batch_size.max(1));

    for (index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        let number = index + 1;
        match store.insert(table, batch).await {
            Ok(()) => {
                outcome.inserted += batch.len();
                log::info!(
                    "Batch {}/{} of {}: {} record(s) inserted",
                    number,
                    total,
                    table.cyan(),
                    batch.len()
                );
            }
            Err(e) => {
                log::warn!(
                    "Batch {}/{} of {} failed, retrying record by record: {}",
                    number,
                    total,
                    table.cyan(),
                    e
                );
                let retried = insert_individually(store, table, batch, key_column).await;
                outcome.inserted += retried.inserted;
                outcome.failures.extend(retried.failures);
            }
        }
    }

    outcome
}

/// Insert each record on its own, isolating failures.
pub async fn insert_individually<S: TargetStore + ?Sized>(
    store: &S,
    table: &str,
    records: &[Record],
    key_column: &str,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for record in records {
        match store.insert(table, std::slice::from_ref(record)).await {
            Ok(()) => outcome.inserted += 1,
            Err(e) => {
                let key = record.get(key_column).and_then(Scalar::as_key);
                log::warn!(
                    "Record {} of {} rejected: {}",
                    key.as_deref().unwrap_or("<no key>").yellow(),
                    table.cyan(),
                    e
                );
                outcome
                    .failures
                    .push(RecordFailure::new(table, key, e.to_string()));
            }
        }
    }

    outcome
}
