// Request/response types shared by completion providers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A chat message: `role` is "user" or "assistant"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,

    /// Overrides the provider's configured temperature for this call
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
        }
    }

    /// Request consisting of one user message
    pub fn user(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::user(prompt)])
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token usage reported for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Text of the first choice plus its token usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// Errors from completion providers
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

impl ProviderError {
    /// Transport failures, rate limits, server errors and garbled bodies are
    /// worth another attempt; auth and request errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::RateLimited { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500 || *status == 408,
            ProviderError::InvalidResponse(_) => true,
            ProviderError::MissingApiKey(_) => false,
        }
    }

    /// Server-requested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Estimate the token count of a piece of text.
///
/// 3 chars per token: prose averages closer to 4, but code is denser and an
/// overestimate is harmless for accounting.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(3)
}

/// Estimate the prompt tokens of a request: 4 tokens of framing per message
/// plus 3 for the reply primer.
pub fn estimate_prompt_tokens(messages: &[Message]) -> u64 {
    messages
        .iter()
        .map(|m| estimate_tokens(&m.content) + estimate_tokens(&m.role) + 4)
        .sum::<u64>()
        + 3
}
