//! Structured load results
//!
//! [`LoadReport`] is what the caller serializes into the execution report.
//! Field names on the wire follow the report format the execution log
//! consumers already read (`registros_processados`, `resultados_por_tabela`,
//! `erro`).

use super::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A record that could not be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    pub reason: String,
}

impl RecordFailure {
    pub fn new(table: impl Into<String>, unique_key: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            unique_key,
            reason: reason.into(),
        }
    }
}

/// Result of loading one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOutcome {
    pub table: String,
    /// Records handed to the loader
    pub received: usize,
    /// Records left after cleansing
    pub cleansed: usize,
    /// Records skipped because their key is already in the store
    pub already_present: usize,
    /// Records skipped because an earlier record in the input had the same key
    pub duplicates: usize,
    pub inserted: usize,
    pub failures: Vec<RecordFailure>,
}

impl TableOutcome {
    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }
}

/// Overall status of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Every table loaded and every new record was inserted
    Success,
    /// At least one table or record failed; the rest went through
    Partial,
    /// Nothing was written: the tenant is not accessible to the principal
    Unauthorized,
    /// Nothing was written: the store could not be reached
    Unreachable,
}

/// Typed summary of a `load_all` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub tenant_key: String,
    #[serde(rename = "registros_processados")]
    pub inserted_count: usize,
    #[serde(
        rename = "resultados_por_tabela",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub per_table_counts: BTreeMap<String, usize>,
    #[serde(rename = "erro")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub table_errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_records: Vec<RecordFailure>,
}

impl LoadReport {
    /// Start an empty, successful report
    pub fn new(tenant_key: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Success,
            tenant_key: tenant_key.into(),
            inserted_count: 0,
            per_table_counts: BTreeMap::new(),
            error: None,
            table_errors: BTreeMap::new(),
            failed_records: Vec::new(),
        }
    }

    /// A report for a load that stopped before writing anything
    pub fn aborted(tenant_key: impl Into<String>, error: &LoadError) -> Self {
        let status = match error {
            LoadError::Unreachable(_) => LoadStatus::Unreachable,
            _ => LoadStatus::Unauthorized,
        };
        Self {
            status,
            error: Some(error.to_string()),
            ..Self::new(tenant_key)
        }
    }

    /// Fold one table's outcome into the totals
    pub fn record_table(&mut self, outcome: TableOutcome) {
        self.inserted_count += outcome.inserted;
        self.per_table_counts.insert(outcome.table, outcome.inserted);
        if !outcome.failures.is_empty() {
            self.status = LoadStatus::Partial;
            self.failed_records.extend(outcome.failures);
        }
    }

    /// Record a table that failed as a whole
    pub fn record_table_error(&mut self, table: impl Into<String>, error: &LoadError) {
        let table = table.into();
        self.per_table_counts.insert(table.clone(), 0);
        self.table_errors.insert(table, error.to_string());
        self.status = LoadStatus::Partial;
    }

    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }

    /// True when the load was stopped before any table was attempted
    pub fn is_aborted(&self) -> bool {
        matches!(
            self.status,
            LoadStatus::Unauthorized | LoadStatus::Unreachable
        )
    }
}
