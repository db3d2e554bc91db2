//! Loader configuration
//!
//! Everything the loader needs to reach and write to the target store is
//! passed in through [`LoaderConfig`]; nothing is read from globals once the
//! config is built.

use crate::client::Credential;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_PAGE_SIZE: usize = 1000;
/// Default `max-rows` of PostgREST/Supabase; larger windows come back capped
pub const SERVER_MAX_ROWS: usize = 1000;
pub const DEFAULT_KEY_COLUMN: &str = "unique_key";
pub const DEFAULT_STORAGE_DIR: &str = "storage";

/// What to do when the existing-key scan of a table fails part way.
///
/// Proceeding with an incomplete key set can re-insert rows that are already
/// present, so the default aborts that table's load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadErrorPolicy {
    /// Skip the table and report the read error
    #[default]
    Abort,
    /// Treat the table as empty and insert everything (may duplicate rows)
    AssumeEmpty,
}

impl FromStr for ReadErrorPolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "assume-empty" | "assume_empty" | "empty" => Ok(Self::AssumeEmpty),
            other => Err(eyre!(
                "Unknown read error policy '{}', expected 'abort' or 'assume-empty'",
                other
            )),
        }
    }
}

/// Configuration injected into the loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub store_url: Url,
    pub credential: Credential,
    /// Principal whose tenant membership gates every load
    pub principal_id: String,
    pub batch_size: usize,
    pub page_size: usize,
    pub key_column: String,
    pub on_read_error: ReadErrorPolicy,
    /// Root for per-tenant execution logs
    pub storage_dir: PathBuf,
}

impl LoaderConfig {
    /// Create a config with default batch and page sizes
    pub fn new(store_url: Url, credential: Credential, principal_id: impl Into<String>) -> Self {
        Self {
            store_url,
            credential,
            principal_id: principal_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            on_read_error: ReadErrorPolicy::default(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }

    /// Set the maximum records per insert call (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the existing-key scan window (minimum 1)
    ///
    /// Stores cap each response at their `max-rows` setting
    /// ([`SERVER_MAX_ROWS`] by default). A window above that cap still reads
    /// every key, but each request returns at most the cap.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = key_column.into();
        self
    }

    pub fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.on_read_error = policy;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STORE_URL: Target store base URL (required)
    /// - STORE_APIKEY: Project API key (required)
    /// - STORE_TOKEN: Bearer token overriding the API key (optional)
    /// - STORE_PRINCIPAL_ID: Principal checked against the access table (required)
    /// - LOADER_BATCH_SIZE: Records per insert (optional, default 50)
    /// - LOADER_PAGE_SIZE: Existing-key scan window (optional, default 1000;
    ///   responses are capped by the store's `max-rows`)
    /// - LOADER_KEY_COLUMN: Deduplication column (optional, default unique_key)
    /// - LOADER_ON_READ_ERROR: `abort` or `assume-empty` (optional, default abort)
    /// - LOADER_STORAGE_DIR: Execution log root (optional, default storage)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| eyre!("{} environment variable not set", key))
        };

        let url_str = required("STORE_URL")?;
        let store_url =
            Url::parse(&url_str).with_context(|| format!("Invalid STORE_URL: {}", url_str))?;
        let credential = Credential::new(required("STORE_APIKEY")?, lookup("STORE_TOKEN"));
        let principal_id = required("STORE_PRINCIPAL_ID")?;

        let mut config = Self::new(store_url, credential, principal_id);

        if let Some(value) = lookup("LOADER_BATCH_SIZE") {
            config.batch_size = parse_positive("LOADER_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("LOADER_PAGE_SIZE") {
            config.page_size = parse_positive("LOADER_PAGE_SIZE", &value)?;
            if config.page_size > SERVER_MAX_ROWS {
                log::warn!(
                    "LOADER_PAGE_SIZE {} exceeds the usual store max-rows of {}; pages may come back capped",
                    config.page_size,
                    SERVER_MAX_ROWS
                );
            }
        }
        if let Some(value) = lookup("LOADER_KEY_COLUMN") {
            config.key_column = value;
        }
        if let Some(value) = lookup("LOADER_ON_READ_ERROR") {
            config.on_read_error = value.parse()?;
        }
        if let Some(value) = lookup("LOADER_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(value);
        }

        Ok(config)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    let parsed: usize = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {}", key, value))?;
    if parsed == 0 {
        eyre::bail!("{} must be at least 1", key);
    }
    Ok(parsed)
}
