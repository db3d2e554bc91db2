//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// Runs extract → transform → load over per-table records
///
/// The loader's `Report` is returned as is, so a partially failed load is
/// still an `Ok` carrying its report.
///
/// # Example
/// ```no_run
/// use tenant_loader::config::LoaderConfig;
/// use tenant_loader::etl::Pipeline;
/// use tenant_loader::loader::IncrementalLoader;
/// use tenant_loader::storage::TableFileReader;
/// use tenant_loader::transform::KeyRequired;
/// use tenant_loader::{AccessTable, RestStore};
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
/// let pipeline = Pipeline::new(
///     TableFileReader::new("tables.json"),
///     KeyRequired::new("unique_key"),
///     loader.for_tenant("00000000-0000-0000-0000-000000000001"),
/// );
///
/// let report = pipeline.run().await?;
/// println!("{} record(s) inserted", report.inserted_count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Extract, transform every item, then hand the whole set to the loader.
    ///
    /// An empty extraction still reaches the loader, so the loader's report
    /// always reflects the run.
    ///
    /// # Errors
    /// Returns an error if extraction or transformation fails, or if the
    /// loader could not run
    pub async fn run(&self) -> Result<L::Report> {
        log::debug!("Reading input...");
        let items = self.extractor.extract().await?;
        if items.is_empty() {
            log::warn!("Input holds no tables");
        }

        let transformed = self.transformer.transform_many(items)?;
        log::debug!("{} table(s) ready to load", transformed.len());

        let report = self.loader.load(transformed).await?;
        log::debug!("Pipeline finished");

        Ok(report)
    }
}
