//! Deterministic embedder for tests.

use crate::embedder::{EmbedFuture, Embedder};

/// Embeds text by folding its bytes into a fixed number of buckets.
///
/// Identical texts always produce identical vectors, which is enough for
/// exercising store-then-search paths without a real model.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: u64,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: u64) -> Self {
        Self { dimensions }
    }

    #[expect(clippy::cast_possible_truncation)]
    fn embed_bytes(&self, text: &str) -> Vec<f32> {
        let dims = self.dimensions as usize;
        let mut vector = vec![0.0f32; dims];
        for (i, b) in text.bytes().enumerate() {
            vector[i % dims] += f32::from(b);
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> EmbedFuture<'_> {
        let vector = self.embed_bytes(text);
        Box::pin(async move { Ok(vector) })
    }

    fn dimensions(&self) -> u64 {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
