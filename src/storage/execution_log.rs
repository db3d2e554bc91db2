//! Per-tenant execution log
//!
//! Every run appends one JSON line to
//! `{storage_dir}/{tenant}/logs/executions.log`.

use crate::loader::LoadReport;
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One line of the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEntry {
    pub timestamp: DateTime<Utc>,
    pub tenant_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadReport>,
}

impl ExecutionEntry {
    /// Entry for a run that produced a load report
    pub fn from_report(tenant_id: impl Into<String>, report: LoadReport) -> Self {
        Self {
            timestamp: Utc::now(),
            tenant_id: tenant_id.into(),
            success: report.is_success(),
            error: report.error.clone(),
            report: Some(report),
        }
    }

    /// Entry for a run that failed before loading
    pub fn failed(tenant_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            tenant_id: tenant_id.into(),
            success: false,
            error: Some(error.into()),
            report: None,
        }
    }
}

/// Append-only NDJSON log of executions for one tenant
pub struct ExecutionLog {
    path: PathBuf,
}

impl ExecutionLog {
    /// Log for `tenant_id` under `storage_dir`.
    ///
    /// # Errors
    /// Returns an error if the tenant id is not a plain slug
    /// (letters, digits, `-`, `_`), since it becomes a directory name.
    pub fn for_tenant(storage_dir: impl AsRef<Path>, tenant_id: &str) -> Result<Self> {
        let valid = !tenant_id.is_empty()
            && tenant_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            eyre::bail!("Invalid tenant id for log directory: '{}'", tenant_id);
        }

        Ok(Self {
            path: storage_dir
                .as_ref()
                .join(tenant_id)
                .join("logs")
                .join("executions.log"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, creating the log directory if needed
    pub fn append(&self, entry: &ExecutionEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open execution log: {}", self.path.display()))?;

        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    /// The last `limit` readable entries, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<ExecutionEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read execution log: {}", self.path.display()))?;

        let entries: Vec<ExecutionEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::debug!("Skipping unreadable log line: {}", e);
                    None
                }
            })
            .collect();

        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }
}
