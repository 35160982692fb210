/// Tokenizer wrapper around the HuggingFace `tokenizers` crate.
///
/// Produces input IDs and attention masks for the ONNX embedder. Truncation
/// is deliberately disabled: input past the model's sequence limit is a
/// provider error, never a silent cut.
use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::{Error, Result};

/// Tokenized input for one text.
#[derive(Debug, Clone)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

pub struct TextTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

impl TextTokenizer {
    /// Load a tokenizer from `tokenizer.json` in the model directory.
    pub fn from_model_dir(model_dir: &Path, max_length: usize) -> Result<Self> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(Error::Provider(format!(
                "tokenizer.json not found in {}",
                model_dir.display()
            )));
        }

        let mut inner = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Provider(format!("failed to load tokenizer: {e}")))?;

        // Sequence-limit enforcement happens in tokenize(); a pre-configured
        // truncation rule from the file would hide over-long input.
        let _ = inner.with_truncation(None);

        Ok(Self { inner, max_length })
    }

    /// Tokenize one text, returning input IDs and an attention mask.
    ///
    /// Fails with a provider error when the encoded sequence exceeds the
    /// model's maximum length.
    pub fn tokenize(&self, text: &str) -> Result<TokenizedInput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| Error::Provider(format!("failed to encode text: {e}")))?;

        let token_count = encoding.get_ids().len();
        if token_count > self.max_length {
            return Err(Error::Provider(format!(
                "input of {token_count} tokens exceeds the model limit of {}",
                self.max_length
            )));
        }

        Ok(TokenizedInput {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
        })
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokenizer_file() {
        let result = TextTokenizer::from_model_dir(Path::new("/nonexistent/path"), 512);
        assert!(matches!(result, Err(Error::Provider(_))));
    }

    /// Requires the downloaded model files.
    /// Run with: cargo test tokenizer -- --ignored
    #[test]
    #[ignore]
    fn test_tokenize_with_real_model() {
        let model_dir = Path::new("models/all-MiniLM-L6-v2");
        if !model_dir.join("tokenizer.json").exists() {
            eprintln!("Skipping: model files not downloaded");
            return;
        }

        let tokenizer = TextTokenizer::from_model_dir(model_dir, 512).unwrap();
        let output = tokenizer.tokenize("Hello, world!").unwrap();

        assert!(!output.input_ids.is_empty());
        assert_eq!(output.input_ids.len(), output.attention_mask.len());
        // [CLS] and [SEP] bracket the real tokens
        assert!(output.input_ids.len() >= 3);
    }

    #[test]
    #[ignore]
    fn test_over_long_input_is_rejected() {
        let model_dir = Path::new("models/all-MiniLM-L6-v2");
        if !model_dir.join("tokenizer.json").exists() {
            return;
        }

        let tokenizer = TextTokenizer::from_model_dir(model_dir, 16).unwrap();
        let long_text = "word ".repeat(100);
        assert!(matches!(
            tokenizer.tokenize(&long_text),
            Err(Error::Provider(_))
        ));
    }
}
