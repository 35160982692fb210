/// ONNX Runtime embedder using the `ort` crate.
///
/// Loads an all-MiniLM-L6-v2 ONNX model, runs inference, applies mean
/// pooling over the token embeddings weighted by the attention mask, and
/// L2-normalizes the result.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use super::Embedder;
use super::tokenizer::TextTokenizer;
use crate::error::{Error, Result};

/// Maximum token sequence length accepted by the model.
const MAX_SEQUENCE_LENGTH: usize = 512;

/// ONNX-backed embedder implementing the [`Embedder`] trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: TextTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Load a model from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in `model_dir`;
    /// `dimensions` must match the model's hidden size.
    pub fn new(model_dir: &Path, dimensions: usize) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        if !model_path.exists() {
            return Err(Error::Provider(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!("Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| Error::Provider(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| Error::Provider(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::Provider(format!("model load error: {e}")))?;

        let tokenizer = TextTokenizer::from_model_dir(model_dir, MAX_SEQUENCE_LENGTH)?;

        info!(
            "Embedding model loaded (vocab size: {}, dimensions: {dimensions})",
            tokenizer.vocab_size()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = self.tokenizer.tokenize(text)?;
        let seq_len = tokens.input_ids.len();

        // (shape, data) tuple form avoids ndarray version coupling with ort
        let input_ids = Tensor::from_array(([1usize, seq_len], tokens.input_ids.clone()))
            .map_err(|e| Error::Provider(format!("input_ids error: {e}")))?;
        let attention_mask =
            Tensor::from_array(([1usize, seq_len], tokens.attention_mask.clone()))
                .map_err(|e| Error::Provider(format!("attention_mask error: {e}")))?;
        let token_type_ids = Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))
            .map_err(|e| Error::Provider(format!("token_type_ids error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| Error::Provider(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| Error::Provider(format!("inference failed: {e}")))?;

        // Output shape is [1, seq_len, hidden_size], flattened
        let (_shape, hidden_states) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Provider(format!("output extraction: {e}")))?;

        let pooled = mean_pool(hidden_states, &tokens.attention_mask, self.dimensions);
        Ok(l2_normalize(pooled))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Mean pooling over token embeddings, weighted by the attention mask.
///
/// `hidden_states` is the flattened `[1, seq_len, hidden_size]` output.
fn mean_pool(hidden_states: &[f32], attention_mask: &[i64], hidden_size: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_size];
    let mut token_count = 0.0f32;

    for (token, &mask) in hidden_states.chunks_exact(hidden_size).zip(attention_mask) {
        if mask == 0 {
            continue;
        }
        token_count += 1.0;
        for (acc, &value) in pooled.iter_mut().zip(token) {
            *acc += value;
        }
    }

    if token_count > 0.0 {
        for v in &mut pooled {
            *v /= token_count;
        }
    }

    pooled
}

/// L2-normalize a vector in place, returning it.
fn l2_normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vec {
            *v /= norm;
        }
    }
    vec
}
