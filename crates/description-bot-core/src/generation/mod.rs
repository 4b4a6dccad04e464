//! Description drafting through an external text-completion service.
//!
//! A [`TextGenerator`] turns a fact sheet name into a single-line draft
//! description. Implementations invoke the remote service exactly once per
//! call and clean the raw completion with [`postprocess::clean_completion`].

pub mod openai;
pub mod postprocess;

use async_trait::async_trait;

pub use openai::{OpenAiConfig, OpenAiTextGenerator};

/// Drafts descriptions for fact sheets.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a cleaned, single-line description for `subject_name`.
    ///
    /// The prompt is `prompt_template` immediately followed by
    /// `subject_name`.
    async fn generate_description(
        &self,
        subject_name: &str,
        prompt_template: &str,
    ) -> Result<String, GenerationError>;
}

/// Input of a single completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject_name: String,
    pub prompt_template: String,
    pub model: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(
        subject_name: impl Into<String>,
        prompt_template: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            prompt_template: prompt_template.into(),
            model: model.into(),
            max_tokens,
        }
    }

    /// Full prompt text sent to the service.
    pub fn prompt(&self) -> String {
        format!("{}{}", self.prompt_template, self.subject_name)
    }
}

/// Failure to obtain a draft from the generation service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation client could not be created: {message}")]
    ClientSetup { message: String },

    #[error("Generation request failed: {message}")]
    Transport { message: String },

    #[error("Generation request timed out")]
    Timeout,

    #[error("Generation service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Generation service response could not be read: {message}")]
    InvalidResponse { message: String },

    #[error("Generation service returned no completion")]
    EmptyCompletion,
}

impl GenerationError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::InvalidResponse {
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
