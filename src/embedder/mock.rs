/// Mock embedder for testing.
///
/// Derives a deterministic unit vector from the text's hash, so tests can
/// exercise the full pipeline without model files.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::Embedder;
use crate::error::Result;

/// A mock embedder producing deterministic vectors from text hashes.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);

        // Expand the hash with an LCG so every component differs
        let mut state = hasher.finish();
        let mut embedding = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 33) as f32 / (1u64 << 31) as f32;
            embedding.push(unit - 0.5);
        }

        let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
