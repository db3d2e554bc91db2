//! Tests against a live REST store
//!
//! Run with `cargo test -- --ignored` after exporting STORE_URL,
//! STORE_APIKEY, STORE_PRINCIPAL_ID and TEST_TENANT_KEY. TEST_TABLE names a
//! table the principal may read (defaults to fato_trato).

use eyre::Result;
use tenant_loader::client::{AccessTable, RestStore, TargetStore};
use tenant_loader::config::LoaderConfig;
use tenant_loader::loader::IncrementalLoader;

fn live_store() -> Result<(RestStore, LoaderConfig)> {
    dotenvy::dotenv().ok();
    let config = LoaderConfig::from_env()?;
    let store = RestStore::try_new(
        config.store_url.clone(),
        config.credential.clone(),
        AccessTable::default(),
    )?;
    Ok((store, config))
}

#[tokio::test]
#[ignore = "requires a live store"]
async fn test_live_access_check() -> Result<()> {
    let (store, config) = live_store()?;
    let tenant_key = std::env::var("TEST_TENANT_KEY")?;

    let allowed = store.has_access(&tenant_key, &config.principal_id).await?;
    assert!(allowed);

    let stranger = store
        .has_access(&tenant_key, "00000000-0000-0000-0000-000000000000")
        .await?;
    assert!(!stranger);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a live store"]
async fn test_live_key_scan() -> Result<()> {
    let (store, config) = live_store()?;
    let table = std::env::var("TEST_TABLE").unwrap_or_else(|_| "fato_trato".to_string());

    let page = store.select(&table, &[&config.key_column], 0, 5).await?;
    assert!(page.len() <= 5);

    let loader = IncrementalLoader::new(store, config.with_page_size(100));
    let keys = loader.fetch_existing_keys(&table).await?;
    assert!(keys.len() >= page.len());
    Ok(())
}
