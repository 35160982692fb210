/// OpenAI-compatible chat-completions client.
///
/// Talks to any endpoint speaking the `/chat/completions` wire format
/// (Groq by default). Requests carry a fixed timeout; expiry surfaces as a
/// provider error, and no retry is attempted.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LanguageModel;
use crate::config::LlmConfig;
use crate::error::{Error, Result};

pub struct ChatClient {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatClient {
    /// Build a client from config. The API key is read from the environment
    /// variable named in `api_key_env`; a missing key is a configuration
    /// error surfaced at startup, not at first use.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Config(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

impl LanguageModel for ChatClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {} ({})", url, self.model);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Provider("language model request timed out".to_string())
                } else {
                    Error::Provider(format!("language model request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "language model returned {status}"
            )));
        }

        let body: ChatResponse = resp
            .json()
            .map_err(|e| Error::Provider(format!("invalid completion response: {e}")))?;

        extract_content(body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

fn extract_content(body: ChatResponse) -> Result<String> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("completion response has no choices".to_string()))?;
    Ok(choice.message.content.trim().to_string())
}
