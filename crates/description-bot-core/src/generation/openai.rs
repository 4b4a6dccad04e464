//! [`TextGenerator`] backed by the OpenAI chat completions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::postprocess::clean_completion;
use super::{GenerationError, GenerationRequest, TextGenerator};

/// Connection and model settings for [`OpenAiTextGenerator`].
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Model identifier, e.g. `gpt-3.5-turbo`
    pub model: String,

    /// Upper bound on the completion length in tokens
    pub max_tokens: u32,

    /// API base URL without the `/chat/completions` suffix
    pub base_url: String,

    /// Timeout applied to the whole request
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<REDACTED>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completion client.
///
/// Sends the prompt as a single `system` message and requests one completion.
/// Failures are reported as [`GenerationError`]; nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct OpenAiTextGenerator {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiTextGenerator {
    /// Create a generator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ClientSetup`] when the HTTP client cannot
    /// be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::ClientSetup {
                message: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Request a completion and return the first candidate's raw text.
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = request.prompt();
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "system",
                content: &prompt,
            }],
            max_tokens: request.max_tokens,
        };

        debug!(url = %self.completions_url(), "Sending chat completion request");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Generation service rejected request");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse {
                message: e.to_string(),
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyCompletion)
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    #[instrument(skip(self, prompt_template))]
    async fn generate_description(
        &self,
        subject_name: &str,
        prompt_template: &str,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(
            subject_name,
            prompt_template,
            self.config.model.clone(),
            self.config.max_tokens,
        );

        let raw = self.complete(&request).await?;
        let draft = clean_completion(&raw);

        info!(
            raw_length = raw.len(),
            draft_length = draft.len(),
            "Generated description draft"
        );

        Ok(draft)
    }
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
