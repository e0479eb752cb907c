use std::future::Future;
use std::pin::Pin;

use crate::error::EmbedError;

pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>>;

/// Object-safe embedding provider.
///
/// Implementations turn a piece of text into a fixed-dimensionality vector.
/// The trait is dyn-compatible so callers can hold `Arc<dyn Embedder>` and
/// swap providers per request.
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector of [`Embedder::dimensions`] floats.
    fn embed(&self, text: &str) -> EmbedFuture<'_>;

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> u64;

    fn name(&self) -> &'static str;
}
