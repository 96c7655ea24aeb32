// OpenAI-compatible chat completions provider
//
// Covers api.openai.com (and compatible servers) plus Azure OpenAI deployments,
// which share the body format but differ in URL layout and auth header.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::RetryPolicy;
use super::types::{
    estimate_prompt_tokens, estimate_tokens, Completion, CompletionRequest, Message,
    ProviderError, Usage,
};
use super::LlmProvider;
use crate::config::constants::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::config::SamplingParams;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    OpenAI {
        base_url: String,
    },
    Azure {
        base_url: String,
        deployment: String,
        api_version: String,
    },
}

/// OpenAI / Azure OpenAI chat completions provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    endpoint: Endpoint,
    model: String,
    sampling: SamplingParams,
    retry: RetryPolicy,
    provider_name: String,
}

impl OpenAIProvider {
    /// Create a provider for the public OpenAI API
    pub fn new_openai(api_key: String) -> Result<Self, ProviderError> {
        Self::new(
            api_key,
            Endpoint::OpenAI {
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            },
            DEFAULT_OPENAI_MODEL.to_string(),
            "openai",
        )
    }

    /// Create a provider for an Azure OpenAI deployment
    pub fn new_azure(
        api_key: String,
        base_url: String,
        deployment: String,
        api_version: String,
    ) -> Result<Self, ProviderError> {
        let model = deployment.clone();
        Self::new(
            api_key,
            Endpoint::Azure {
                base_url,
                deployment,
                api_version,
            },
            model,
            "azure",
        )
    }

    fn new(
        api_key: String,
        endpoint: Endpoint,
        model: String,
        provider_name: &str,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(provider_name.to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
            sampling: SamplingParams::default(),
            retry: RetryPolicy::default(),
            provider_name: provider_name.to_string(),
        })
    }

    /// Point an OpenAI provider at a compatible server. No effect on Azure.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Endpoint::OpenAI { base_url } = &mut self.endpoint {
            *base_url = url.into();
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self) -> String {
        match &self.endpoint {
            Endpoint::OpenAI { base_url } => {
                let base = base_url.trim_end_matches('/');
                if base.ends_with("/v1") {
                    format!("{}/chat/completions", base)
                } else {
                    format!("{}/v1/chat/completions", base)
                }
            }
            Endpoint::Azure {
                base_url,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base_url.trim_end_matches('/'),
                deployment,
                api_version
            ),
        }
    }

    fn to_chat_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.sampling.temperature),
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
            max_tokens: self.sampling.max_tokens,
        }
    }

    fn to_completion(
        &self,
        request: &CompletionRequest,
        response: ChatResponse,
    ) -> Result<Completion, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?;

        let text = choice.message.content.unwrap_or_else(|| {
            tracing::warn!("{} returned a choice without content", self.provider_name);
            String::new()
        });

        let usage = match response.usage {
            Some(usage) => Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
            None => {
                tracing::debug!("No usage reported; estimating token counts");
                Usage {
                    prompt_tokens: estimate_prompt_tokens(&request.messages),
                    completion_tokens: estimate_tokens(&text),
                }
            }
        };

        Ok(Completion { text, usage })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn complete_once(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let body = self.to_chat_request(request);

        tracing::debug!(
            "Sending {} message(s) to {} ({})",
            request.messages.len(),
            self.provider_name,
            self.model
        );

        let builder = self.client.post(self.url()).json(&body);
        let builder = match self.endpoint {
            Endpoint::OpenAI { .. } => builder.bearer_auth(&self.api_key),
            Endpoint::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(ProviderError::RateLimited { retry_after });
        }

        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(ProviderError::Api { status, body });
        }

        let raw = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", e, raw)))?;

        self.to_completion(request, parsed)
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone()
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
