/// Embedder trait for text embedding.
///
/// The same embedder instance (and therefore the same model configuration)
/// is used for indexing and for querying, so stored vectors and query
/// vectors always share a dimensionality.
pub mod download;
pub mod mock;
pub mod onnx;
pub mod tokenizer;

use crate::error::Result;

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple text strings into vectors, preserving order.
    ///
    /// The default implementation embeds element by element; overriding it
    /// may change throughput but never the output.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
