//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming data items
///
/// Implementors define how to transform items:
/// - Column filtering
/// - Stamping ownership columns
/// - Dropping invalid records
///
/// # Example
/// ```
/// use tenant_loader::etl::Transformer;
/// use tenant_loader::record::Table;
/// use eyre::Result;
///
/// struct Truncate(usize);
///
/// impl Transformer for Truncate {
///     type Input = Table;
///     type Output = Table;
///
///     fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
///         input.records.truncate(self.0);
///         Ok(input)
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items (default batch implementation)
    ///
    /// Override this for optimized batch processing
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }

    /// Run `next` on the output of this transformer
    fn then<N>(self, next: N) -> Chain<Self, N>
    where
        Self: Sized,
        N: Transformer<Input = Self::Output>,
    {
        Chain {
            first: self,
            second: next,
        }
    }
}

/// Two transformers applied in sequence, see [`Transformer::then`]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Transformer for Chain<A, B>
where
    A: Transformer,
    B: Transformer<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        self.second.transform(self.first.transform(input)?)
    }
}
