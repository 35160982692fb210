//! Grounded prompt construction and answer synthesis.
//!
//! Builds a prompt that restricts the model to the retrieved snippets and
//! fixes the wording it must use when they are insufficient, then invokes
//! the language model and returns its trimmed output.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::llm::LanguageModel;

/// The exact sentence the model is instructed to return when the context
/// does not contain the answer. Also returned directly when retrieval
/// yields nothing.
pub const FALLBACK_ANSWER: &str = "I could not find the answer in the provided documents.";

/// At most this many snippets are embedded in the prompt, regardless of how
/// many were retrieved.
const MAX_PROMPT_SNIPPETS: usize = 3;

/// Each snippet is truncated to this many characters for the prompt.
const SNIPPET_MAX_CHARS: usize = 300;

/// A retrieved text snippet with its source reference.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub text: String,
    pub source: String,
    pub page: u32,
}

pub struct Synthesizer {
    llm: Arc<dyn LanguageModel>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Answer a question from the retrieved snippets.
    ///
    /// Provider failures propagate unmodified; an unanswerable question is
    /// not an error; the model returns the fallback sentence as a normal
    /// answer.
    pub fn answer(&self, question: &str, snippets: &[Snippet]) -> Result<String> {
        let prompt = build_prompt(question, snippets);
        debug!(
            "Synthesizing answer with {} ({} snippets)",
            self.llm.model(),
            snippets.len().min(MAX_PROMPT_SNIPPETS)
        );

        let answer = self.llm.generate(&prompt)?;
        Ok(answer.trim().to_string())
    }
}

/// Build the grounded prompt: numbered context snippets, the question, and
/// the instruction to answer from the context alone.
pub fn build_prompt(question: &str, snippets: &[Snippet]) -> String {
    let mut context = String::new();
    for (i, snippet) in snippets.iter().take(MAX_PROMPT_SNIPPETS).enumerate() {
        let excerpt: String = snippet.text.trim().chars().take(SNIPPET_MAX_CHARS).collect();
        context.push_str(&format!("[{}] {}...\n", i + 1, excerpt));
    }

    format!(
        "You are a helpful AI assistant. Use ONLY the context below to answer the question.\n\
         If the answer is not in the context, respond with \"{FALLBACK_ANSWER}\"\n\
         \n\
         Format your response clearly in Markdown. Add bullet points if applicable.\n\
         \n\
         Context:\n\
         {context}\
         \n\
         Question: {question}\n\
         \n\
         Answer:\n"
    )
}
