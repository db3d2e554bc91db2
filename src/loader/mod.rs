//! Incremental, deduplicated loading into the target store
//!
//! [`IncrementalLoader`] uploads only the records whose key is not already
//! present in the destination table. Deduplication is a pre-check against
//! the store, not a uniqueness constraint, so it assumes a single writer per
//! tenant for the duration of a run.

mod batch;
mod cleanse;
mod error;
mod report;

pub use batch::{BatchOutcome, insert_batches, insert_individually};
pub use cleanse::{Cleanser, normalize_column};
pub use error::LoadError;
pub use report::{LoadReport, LoadStatus, RecordFailure, TableOutcome};

use crate::client::TargetStore;
use crate::config::{LoaderConfig, ReadErrorPolicy, SERVER_MAX_ROWS};
use crate::etl::Loader;
use crate::record::{Record, Scalar, Table};
use async_trait::async_trait;
use eyre::Result;
use owo_colors::OwoColorize;
use std::collections::HashSet;

/// Loads per-table records into a [`TargetStore`], skipping known keys.
///
/// # Example
/// ```no_run
/// use tenant_loader::client::{AccessTable, RestStore};
/// use tenant_loader::config::LoaderConfig;
/// use tenant_loader::loader::IncrementalLoader;
/// use tenant_loader::record::Table;
/// use tenant_loader::record;
///
/// # async fn example() -> eyre::Result<()> {
/// let config = LoaderConfig::from_env()?;
/// let store = RestStore::try_new(
///     config.store_url.clone(),
///     config.credential.clone(),
///     AccessTable::default(),
/// )?;
/// let loader = IncrementalLoader::new(store, config);
///
/// let tables = vec![Table::new(
///     "fato_trato",
///     vec![record! { "unique_key" => "2024-01-01|C01|1", "realizado_kg" => 812.5 }],
/// )];
/// let report = loader
///     .load_all("00000000-0000-0000-0000-000000000001", tables)
///     .await;
/// println!("{} inserted", report.inserted_count);
/// # Ok(())
/// # }
/// ```
pub struct IncrementalLoader<S> {
    store: S,
    config: LoaderConfig,
    cleanser: Cleanser,
}

impl<S: TargetStore> IncrementalLoader<S> {
    pub fn new(store: S, config: LoaderConfig) -> Self {
        Self {
            store,
            config,
            cleanser: Cleanser::default(),
        }
    }

    /// Replace the default cleansing rules
    pub fn with_cleanser(mut self, cleanser: Cleanser) -> Self {
        self.cleanser = cleanser;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Normalize records ahead of upload
    pub fn cleanse(&self, records: Vec<Record>) -> Vec<Record> {
        self.cleanser.cleanse(records)
    }

    /// Collect every key currently stored in `table`.
    ///
    /// Reads the key column in windows of `page_size` rows until a window
    /// comes back short. Windows larger than [`SERVER_MAX_ROWS`] count as
    /// full once they return that many rows, since the store caps them. What happens on a read error is decided by
    /// [`ReadErrorPolicy`].
    pub async fn fetch_existing_keys(&self, table: &str) -> Result<HashSet<String>, LoadError> {
        let key_column = self.config.key_column.as_str();
        let page_size = self.config.page_size.max(1);
        let full_page = page_size.min(SERVER_MAX_ROWS);
        let mut keys = HashSet::new();
        let mut offset = 0;

        loop {
            let page = match self
                .store
                .select(table, &[key_column], offset, page_size)
                .await
            {
                Ok(page) => page,
                Err(source) => match self.config.on_read_error {
                    ReadErrorPolicy::Abort => {
                        return Err(LoadError::KeyRead {
                            table: table.to_string(),
                            source,
                        });
                    }
                    ReadErrorPolicy::AssumeEmpty => {
                        log::warn!(
                            "Failed to read keys of {} ({}), assuming it is empty; duplicates may be inserted",
                            table.cyan(),
                            source
                        );
                        return Ok(HashSet::new());
                    }
                },
            };

            let rows = page.len();
            keys.extend(
                page.iter()
                    .filter_map(|row| row.get(key_column).and_then(Scalar::as_key)),
            );

            // A page shorter than the window is the last one, unless the
            // store capped it at its max-rows
            if rows == 0 || rows < full_page {
                break;
            }
            offset += rows;
        }

        log::info!("Found {} existing key(s) in {}", keys.len(), table.cyan());
        Ok(keys)
    }

    /// Cleanse `records` and insert the ones whose key is not yet stored.
    pub async fn load_table(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> Result<TableOutcome, LoadError> {
        let mut outcome = TableOutcome {
            table: table.to_string(),
            received: records.len(),
            ..Default::default()
        };

        let records = self.cleanse(records);
        outcome.cleansed = records.len();
        if records.is_empty() {
            log::warn!("No valid records to upload to {}", table.cyan());
            return Ok(outcome);
        }

        let existing = self.fetch_existing_keys(table).await?;

        let key_column = self.config.key_column.as_str();
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        for record in records {
            let Some(key) = record.get(key_column).and_then(Scalar::as_key) else {
                outcome.failures.push(RecordFailure::new(
                    table,
                    None,
                    format!("missing {}", key_column),
                ));
                continue;
            };
            if existing.contains(&key) {
                outcome.already_present += 1;
            } else if !seen.insert(key) {
                outcome.duplicates += 1;
            } else {
                fresh.push(record);
            }
        }

        log::info!(
            "{}: {} record(s), {} already stored, {} repeated, {} new",
            table.cyan(),
            outcome.cleansed,
            outcome.already_present,
            outcome.duplicates,
            fresh.len().green()
        );

        if fresh.is_empty() {
            log::info!("All records already exist in {}", table.cyan());
            return Ok(outcome);
        }

        let inserted = insert_batches(
            &self.store,
            table,
            &fresh,
            self.config.batch_size,
            key_column,
        )
        .await;
        outcome.inserted = inserted.inserted;
        outcome.failures.extend(inserted.failures);

        Ok(outcome)
    }

    /// Verify the configured principal may write to `tenant_key`.
    pub async fn check_access(&self, tenant_key: &str) -> Result<(), LoadError> {
        let principal_id = self.config.principal_id.as_str();
        match self.store.has_access(tenant_key, principal_id).await {
            Ok(true) => {
                log::info!(
                    "Access verified for tenant {} and principal {}",
                    tenant_key.cyan(),
                    principal_id.cyan()
                );
                Ok(())
            }
            Ok(false) => Err(LoadError::Unauthorized {
                tenant_key: tenant_key.to_string(),
                principal_id: principal_id.to_string(),
            }),
            Err(e) if e.is_unreachable() => Err(LoadError::Unreachable(e)),
            Err(source) => Err(LoadError::AccessCheck {
                tenant_key: tenant_key.to_string(),
                source,
            }),
        }
    }

    /// Load every table for `tenant_key`.
    ///
    /// Access is checked once before anything is written; a failed check
    /// aborts the whole load. After that each table is loaded on its own and
    /// a failing table only zeroes its own count.
    pub async fn load_all(
        &self,
        tenant_key: &str,
        tables: impl IntoIterator<Item = Table>,
    ) -> LoadReport {
        if let Err(e) = self.check_access(tenant_key).await {
            log::error!("Load aborted: {}", e);
            return LoadReport::aborted(tenant_key, &e);
        }

        let mut report = LoadReport::new(tenant_key);
        for table in tables {
            if table.is_empty() {
                log::info!("No records for {}", table.name.cyan());
                report.record_table(TableOutcome::empty(table.name));
                continue;
            }

            log::info!("Processing table {}", table.name.cyan());
            match self.load_table(&table.name, table.records).await {
                Ok(outcome) => report.record_table(outcome),
                Err(e) => {
                    log::error!("Table {} failed: {}", table.name.cyan(), e);
                    report.record_table_error(&table.name, &e);
                }
            }
        }

        log::info!(
            "Loaded {} record(s) for tenant {}",
            report.inserted_count.green(),
            tenant_key.cyan()
        );
        report
    }

    /// Bind this loader to one tenant so it can close a [`crate::etl::Pipeline`]
    pub fn for_tenant(&self, tenant_key: impl Into<String>) -> TenantLoader<'_, S> {
        TenantLoader {
            loader: self,
            tenant_key: tenant_key.into(),
        }
    }
}

/// An [`IncrementalLoader`] bound to a tenant
pub struct TenantLoader<'a, S> {
    loader: &'a IncrementalLoader<S>,
    tenant_key: String,
}

impl<S> TenantLoader<'_, S> {
    pub fn tenant_key(&self) -> &str {
        &self.tenant_key
    }
}

#[async_trait]
impl<'a, S: TargetStore> Loader for TenantLoader<'a, S> {
    type Item = Table;
    type Report = LoadReport;

    async fn load(&self, items: Vec<Self::Item>) -> Result<Self::Report> {
        Ok(self.loader.load_all(&self.tenant_key, items).await)
    }
}
