/// Mock language model for testing.
///
/// Imitates a grounded model offline: it answers from the prompt's context
/// lines when one of them shares a keyword with the question, and returns
/// the fallback sentence otherwise. This keeps the end-to-end retrieval and
/// fallback scenarios testable without network access.
use super::LanguageModel;
use crate::error::Result;
use crate::synthesizer::FALLBACK_ANSWER;

pub struct MockLanguageModel;

impl LanguageModel for MockLanguageModel {
    fn generate(&self, prompt: &str) -> Result<String> {
        // Context snippets carry 1-based [i] labels; nothing else in the
        // prompt starts a line with '['.
        let snippets: Vec<&str> = prompt
            .lines()
            .filter(|line| line.starts_with('['))
            .collect();
        if snippets.is_empty() {
            return Ok(FALLBACK_ANSWER.to_string());
        }

        let question = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or_default();

        let keywords: Vec<String> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 4)
            .map(str::to_lowercase)
            .collect();

        let grounded = snippets.iter().any(|s| {
            let lower = s.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        });

        if grounded {
            Ok(snippets.join("\n"))
        } else {
            Ok(FALLBACK_ANSWER.to_string())
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
