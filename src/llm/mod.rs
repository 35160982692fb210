/// Language model clients for answer generation.
pub mod chat;
pub mod mock;

use crate::error::Result;

/// Trait for language model backends.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the prompt, returning trimmed text.
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
