//! Extractor trait for reading records from a source

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define where tables come from: an upstream export file,
/// another service, a fixture in tests.
///
/// # Example
/// ```no_run
/// use tenant_loader::etl::Extractor;
/// use tenant_loader::record::Table;
/// use eyre::Result;
///
/// struct FixedTables(Vec<Table>);
///
/// impl Extractor for FixedTables {
///     type Item = Table;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract items from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}
