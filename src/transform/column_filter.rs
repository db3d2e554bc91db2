//! Column allow-list transformer
//!
//! Keeps only the columns each destination table is known to have, so
//! extra spreadsheet columns never reach the store.

use crate::etl::Transformer;
use crate::record::Table;
use eyre::Result;
use std::collections::{HashMap, HashSet};

/// Transformer that keeps only allow-listed columns per table
///
/// Tables without an allow-list pass through untouched.
///
/// # Example
/// ```
/// use tenant_loader::transform::ColumnAllowList;
/// use tenant_loader::etl::Transformer;
/// use tenant_loader::record::Table;
/// use tenant_loader::record;
///
/// let filter = ColumnAllowList::new().allow("fato_trato", vec!["unique_key", "realizado_kg"]);
/// let table = Table::new(
///     "fato_trato",
///     vec![record! { "unique_key" => "k", "realizado_kg" => 10.0, "scratch" => "x" }],
/// );
///
/// let output = filter.transform(table).unwrap();
/// assert!(!output.records[0].contains_key("scratch"));
/// assert_eq!(output.records[0].len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnAllowList {
    tables: HashMap<String, HashSet<String>>,
}

impl ColumnAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `columns` for `table`, replacing any previous list
    pub fn allow(mut self, table: impl Into<String>, columns: Vec<&str>) -> Self {
        self.tables.insert(
            table.into(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Build from `(table, columns)` pairs
    pub fn from_tables<I, C>(tables: I) -> Self
    where
        I: IntoIterator<Item = (String, C)>,
        C: IntoIterator<Item = String>,
    {
        Self {
            tables: tables
                .into_iter()
                .map(|(name, columns)| (name, columns.into_iter().collect()))
                .collect(),
        }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }
}

impl Transformer for ColumnAllowList {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let Some(allowed) = self.tables.get(&input.name) else {
            log::debug!("No column allow-list for {}, keeping all columns", input.name);
            return Ok(input);
        };

        let mut dropped = HashSet::new();
        for record in input.records.iter_mut() {
            record.retain(|column, _| {
                let keep = allowed.contains(column);
                if !keep {
                    dropped.insert(column.clone());
                }
                keep
            });
        }

        if !dropped.is_empty() {
            let mut dropped: Vec<_> = dropped.into_iter().collect();
            dropped.sort();
            log::info!(
                "Dropped {} unknown column(s) from {}: {}",
                dropped.len(),
                input.name,
                dropped.join(", ")
            );
        }

        Ok(input)
    }
}
