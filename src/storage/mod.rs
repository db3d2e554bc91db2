//! File system storage operations
//!
//! This module handles all file I/O operations including:
//! - Reading extracted tables from input files
//! - The load manifest
//! - Per-tenant execution logs

mod execution_log;
mod input;
mod manifest;

pub use execution_log::{ExecutionEntry, ExecutionLog};
pub use input::{TableFileReader, parse_tables};
pub use manifest::{LoadManifest, TableEntry, TenantEntry};
