//! In-memory target store with failure injection for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tenant_loader::client::{StoreError, TargetStore};
use tenant_loader::config::LoaderConfig;
use tenant_loader::record::{Record, Scalar};
use tenant_loader::Credential;
use url::Url;

pub const TENANT: &str = "00000000-0000-0000-0000-000000000001";
pub const PRINCIPAL: &str = "principal-1";
pub const KEY: &str = "unique_key";

/// One recorded `insert` call
#[derive(Debug, Clone)]
pub struct InsertCall {
    pub table: String,
    pub keys: Vec<String>,
}

#[derive(Default)]
struct State {
    rows: BTreeMap<String, Vec<Record>>,
    inserts: Vec<InsertCall>,
    selects: usize,
}

/// Fake store keeping rows per table in memory
///
/// Rejects any insert batch containing a key listed in `failing_keys`, which
/// mirrors a bulk insert failing as a whole when one row is bad.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
    members: HashSet<(String, String)>,
    failing_keys: HashSet<String>,
    /// Table → first offset whose select fails
    failing_select: HashMap<String, usize>,
    row_cap: Option<usize>,
    access_error: Option<StoreError>,
}

impl FakeStore {
    /// Store where `PRINCIPAL` is a member of `TENANT`
    pub fn new() -> Self {
        Self::default().with_member(TENANT, PRINCIPAL)
    }

    pub fn with_member(mut self, tenant: &str, principal: &str) -> Self {
        self.members
            .insert((tenant.to_string(), principal.to_string()));
        self
    }

    /// Seed `table` with rows holding only the given keys
    pub fn with_keys(self, table: &str, keys: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let rows = state.rows.entry(table.to_string()).or_default();
            for key in keys {
                let mut row = Record::new();
                row.insert(KEY.to_string(), Scalar::from(*key));
                rows.push(row);
            }
        }
        self
    }

    pub fn failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn failing_select(self, table: &str) -> Self {
        self.failing_select_from(table, 0)
    }

    /// Fail selects on `table` once the scan reaches `offset`
    pub fn failing_select_from(mut self, table: &str, offset: usize) -> Self {
        self.failing_select.insert(table.to_string(), offset);
        self
    }

    /// Return at most `cap` rows per select, like a store's max-rows
    pub fn with_row_cap(mut self, cap: usize) -> Self {
        self.row_cap = Some(cap);
        self
    }

    pub fn access_error(mut self, error: StoreError) -> Self {
        self.access_error = Some(error);
        self
    }

    pub fn inserts(&self) -> Vec<InsertCall> {
        self.state.lock().unwrap().inserts.clone()
    }

    pub fn select_calls(&self) -> usize {
        self.state.lock().unwrap().selects
    }

    pub fn max_batch(&self) -> usize {
        self.inserts().iter().map(|c| c.keys.len()).max().unwrap_or(0)
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Stored keys of `table`, in insertion order
    pub fn keys(&self, table: &str) -> Vec<String> {
        self.rows(table)
            .iter()
            .filter_map(|r| r.get(KEY).and_then(Scalar::as_key))
            .collect()
    }
}

#[async_trait]
impl TargetStore for FakeStore {
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.selects += 1;
        if self
            .failing_select
            .get(table)
            .is_some_and(|from| offset >= *from)
        {
            return Err(StoreError::Rejected {
                status: 500,
                body: "select failed".to_string(),
            });
        }

        let mut rows = state.rows.get(table).cloned().unwrap_or_default();
        rows.sort_by_key(|r| r.get(KEY).and_then(Scalar::as_key));
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit.min(self.row_cap.unwrap_or(usize::MAX)))
            .map(|row| {
                row.into_iter()
                    .filter(|(column, _)| columns.contains(&column.as_str()))
                    .collect()
            })
            .collect())
    }

    async fn insert(&self, table: &str, records: &[Record]) -> Result<(), StoreError> {
        let keys: Vec<String> = records
            .iter()
            .map(|r| r.get(KEY).and_then(Scalar::as_key).unwrap_or_default())
            .collect();

        let mut state = self.state.lock().unwrap();
        state.inserts.push(InsertCall {
            table: table.to_string(),
            keys: keys.clone(),
        });

        if let Some(bad) = keys.iter().find(|k| self.failing_keys.contains(*k)) {
            return Err(StoreError::Rejected {
                status: 400,
                body: format!("invalid row {}", bad),
            });
        }

        state
            .rows
            .entry(table.to_string())
            .or_default()
            .extend(records.iter().cloned());
        Ok(())
    }

    async fn has_access(&self, tenant_key: &str, principal_id: &str) -> Result<bool, StoreError> {
        if let Some(error) = &self.access_error {
            return Err(error.clone());
        }
        Ok(self
            .members
            .contains(&(tenant_key.to_string(), principal_id.to_string())))
    }
}

/// Loader configuration pointing nowhere; the fake store ignores it
pub fn config() -> LoaderConfig {
    LoaderConfig::new(
        Url::parse("http://localhost:54321").unwrap(),
        Credential::new("anon-key", None),
        PRINCIPAL,
    )
}

/// A record with a key and a value column
pub fn row(key: &str, value: f64) -> Record {
    let mut record = Record::new();
    record.insert(KEY.to_string(), Scalar::from(key));
    record.insert("realizado_kg".to_string(), Scalar::from(value));
    record
}
