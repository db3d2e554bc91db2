//! CLI helper functions

use crate::{
    client::{RestStore, TargetStore},
    config::LoaderConfig,
    etl::{Pipeline, Transformer},
    loader::{Cleanser, IncrementalLoader, LoadReport},
    storage::{ExecutionEntry, ExecutionLog, LoadManifest, TableFileReader},
    transform::{KeyRequired, TenantStamper},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// Build the REST store described by `config` and `manifest`
pub fn build_store(config: &LoaderConfig, manifest: &LoadManifest) -> Result<RestStore> {
    RestStore::try_new(
        config.store_url.clone(),
        config.credential.clone(),
        manifest.access.clone(),
    )
    .context("Failed to create target store client")
}

/// Build a loader over `store` using the manifest's tenant column
pub fn build_loader<S: TargetStore>(
    store: S,
    config: LoaderConfig,
    manifest: &LoadManifest,
) -> IncrementalLoader<S> {
    let cleanser = Cleanser::default().add_foreign_key(manifest.tenant_column.clone());
    IncrementalLoader::new(store, config).with_cleanser(cleanser)
}

/// Run one tenant's load from an input file
///
/// Pipeline: TableFileReader → ColumnAllowList → TenantStamper → KeyRequired → IncrementalLoader
pub async fn run_pipeline<S: TargetStore>(
    loader: &IncrementalLoader<S>,
    manifest: &LoadManifest,
    tenant: &str,
    input: impl AsRef<Path>,
) -> Result<LoadReport> {
    let tenant_key = manifest.resolve_tenant(tenant)?;
    log::info!("Tenant {} resolved to {}", tenant.cyan(), tenant_key.cyan());

    let transformer = manifest
        .column_allow_list()
        .then(TenantStamper::new(manifest.tenant_column.clone(), tenant_key.clone()))
        .then(KeyRequired::new(loader.config().key_column.clone()));

    let pipeline = Pipeline::new(
        TableFileReader::new(input),
        transformer,
        loader.for_tenant(tenant_key),
    );

    pipeline.run().await
}

/// Load a tenant's input file into the target store and record the run
///
/// Reads configuration from the environment and the manifest from
/// `manifest_path` (built-in tables if it does not exist). The outcome is
/// appended to the tenant's execution log whether or not the load succeeds.
pub async fn load_tenant(
    tenant: &str,
    input: impl AsRef<Path>,
    manifest_path: impl AsRef<Path>,
) -> Result<LoadReport> {
    let config = LoaderConfig::from_env()?;
    let manifest = LoadManifest::read_or_builtin(manifest_path)?;
    let execution_log = ExecutionLog::for_tenant(&config.storage_dir, tenant)?;

    log::info!("Connecting to target store...");
    let store = build_store(&config, &manifest)?;
    let loader = build_loader(store, config, &manifest);

    let result = run_pipeline(&loader, &manifest, tenant, input).await;

    let entry = match &result {
        Ok(report) => ExecutionEntry::from_report(tenant, report.clone()),
        Err(e) => ExecutionEntry::failed(tenant, format!("{:#}", e)),
    };
    if let Err(e) = execution_log.append(&entry) {
        log::warn!("Failed to write execution log: {}", e);
    } else {
        log::debug!("Execution logged to {}", execution_log.path().display());
    }

    result
}

/// Check that the configured principal may load data for `tenant`
pub async fn check_auth(tenant: &str, manifest_path: impl AsRef<Path>) -> Result<String> {
    let config = LoaderConfig::from_env()?;
    let manifest = LoadManifest::read_or_builtin(manifest_path)?;
    let tenant_key = manifest.resolve_tenant(tenant)?;

    let store = build_store(&config, &manifest)?;
    let loader = build_loader(store, config, &manifest);
    loader.check_access(&tenant_key).await?;

    Ok(tenant_key)
}

/// Count the keys currently stored in `table`
pub async fn count_keys(table: &str, manifest_path: impl AsRef<Path>) -> Result<usize> {
    let config = LoaderConfig::from_env()?;
    let manifest = LoadManifest::read_or_builtin(manifest_path)?;

    let store = build_store(&config, &manifest)?;
    let loader = build_loader(store, config, &manifest);
    let keys = loader
        .fetch_existing_keys(table)
        .await
        .with_context(|| format!("Failed to read keys from {}", table))?;

    Ok(keys.len())
}

/// Read the last `limit` executions of `tenant`
pub fn recent_executions(tenant: &str, limit: usize) -> Result<Vec<ExecutionEntry>> {
    let storage_dir = std::env::var("LOADER_STORAGE_DIR")
        .unwrap_or_else(|_| crate::config::DEFAULT_STORAGE_DIR.to_string());
    ExecutionLog::for_tenant(storage_dir, tenant)?.recent(limit)
}
