//! Embedding provider abstraction and backend implementations.

pub mod embedder;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;

pub use embedder::Embedder;
pub use error::EmbedError;
