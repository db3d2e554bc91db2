//! Loader trait for writing data to destinations

use async_trait::async_trait;
use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Loaders describe what they did through their own `Report` type, so a
/// partial load can be reported without being turned into an error.
///
/// # Example
/// ```no_run
/// use tenant_loader::etl::Loader;
/// use async_trait::async_trait;
/// use eyre::Result;
///
/// struct CountingLoader;
///
/// #[async_trait]
/// impl Loader for CountingLoader {
///     type Item = String;
///     type Report = usize;
///
///     async fn load(&self, items: Vec<Self::Item>) -> Result<Self::Report> {
///         Ok(items.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// The type of items to load
    type Item: Send;

    /// Summary of what was loaded
    type Report: Send;

    /// Load items to the destination
    ///
    /// # Errors
    /// Returns an error only if the load could not be attempted at all;
    /// per-item failures belong in the report.
    async fn load(&self, items: Vec<Self::Item>) -> Result<Self::Report>;
}
