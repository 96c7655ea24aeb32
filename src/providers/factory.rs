// Provider factory
//
// Creates the completion provider described by the loaded configuration

use anyhow::{Context, Result};
use std::sync::Arc;

use super::openai::OpenAIProvider;
use super::retry::RetryPolicy;
use super::LlmProvider;
use crate::config::{Config, ProviderEntry, RetryConfig, SamplingParams};

/// Create an `LlmProvider` from a single provider entry.
pub fn create_provider_from_entry(
    entry: &ProviderEntry,
    sampling: &SamplingParams,
    retry: &RetryConfig,
) -> Result<Arc<dyn LlmProvider>> {
    let provider = match entry {
        ProviderEntry::Openai {
            api_key,
            model,
            base_url,
            ..
        } => {
            let mut provider = OpenAIProvider::new_openai(api_key.clone())
                .with_context(|| format!("Failed to create provider '{}'", entry.display_name()))?;
            if let Some(url) = base_url {
                provider = provider.with_base_url(url.clone());
            }
            if let Some(m) = model {
                provider = provider.with_model(m.clone());
            }
            provider
        }

        ProviderEntry::Azure {
            api_key,
            base_url,
            deployment,
            api_version,
            ..
        } => OpenAIProvider::new_azure(
            api_key.clone(),
            base_url.clone(),
            deployment.clone(),
            api_version.clone(),
        )
        .with_context(|| format!("Failed to create provider '{}'", entry.display_name()))?,
    };

    Ok(Arc::new(
        provider
            .with_sampling(sampling.clone())
            .with_retry_policy(RetryPolicy::from_config(retry)),
    ))
}

/// Create the provider for a run: the first configured entry is used.
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
    let entry = config
        .providers
        .first()
        .context("No providers configured")?;
    if config.providers.len() > 1 {
        tracing::info!(
            "{} providers configured; using '{}'",
            config.providers.len(),
            entry.display_name()
        );
    }
    tracing::info!(
        "Using {} provider '{}'",
        entry.provider_type(),
        entry.display_name()
    );
    create_provider_from_entry(entry, &config.sampling, &config.retry)
}
