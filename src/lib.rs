//! Tenant Loader
//!
//! Incremental, deduplicated bulk loading of per-tenant ETL output into a
//! remote table store.

pub mod cli;
pub mod client;
pub mod config;
pub mod etl;
pub mod loader;
pub mod record;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use client::{AccessTable, Credential, RestStore, StoreError, TargetStore};
pub use config::{LoaderConfig, ReadErrorPolicy};
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use loader::{Cleanser, IncrementalLoader, LoadError, LoadReport, LoadStatus};
pub use record::{Record, Scalar, Table};
pub use storage::{ExecutionLog, LoadManifest, TableFileReader};
