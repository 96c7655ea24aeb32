// Provider entries and model presets

use serde::{Deserialize, Serialize};

use super::constants::DEFAULT_AZURE_API_VERSION;

fn default_azure_api_version() -> String {
    DEFAULT_AZURE_API_VERSION.to_string()
}

/// A single completion endpoint.
///
/// Serializes with a `type` tag, e.g.:
/// ```toml
/// [[providers]]
/// type = "openai"
/// api_key = "sk-..."
/// model = "gpt4"
///
/// [[providers]]
/// type = "azure"
/// api_key = "..."
/// base_url = "https://my-resource.openai.azure.com"
/// deployment = "gpt-35-turbo"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderEntry {
    Openai {
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Azure {
        api_key: String,
        base_url: String,
        deployment: String,
        #[serde(default = "default_azure_api_version")]
        api_version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ProviderEntry {
    /// Human-readable name for log output.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Openai { name, .. } => name.as_deref().unwrap_or("OpenAI"),
            Self::Azure { name, .. } => name.as_deref().unwrap_or("Azure OpenAI"),
        }
    }

    /// Short provider-type tag ("openai" or "azure").
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Openai { .. } => "openai",
            Self::Azure { .. } => "azure",
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Self::Openai { api_key, .. } | Self::Azure { api_key, .. } => api_key,
        }
    }

    /// Replace the model. Presets are resolved; Azure entries take it as the deployment.
    pub fn set_model(&mut self, requested: &str) {
        let resolved = resolve_model_alias(requested).to_string();
        match self {
            Self::Openai { model, .. } => *model = Some(resolved),
            Self::Azure { deployment, .. } => *deployment = resolved,
        }
    }

    /// Build entries from environment variables, OpenAI first.
    ///
    /// `lookup` abstracts `std::env::var` so tests don't touch the process env.
    pub fn from_env_vars<F>(lookup: F) -> Vec<ProviderEntry>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut entries = Vec::new();

        if let Some(api_key) = get("OPENAI_API_KEY") {
            entries.push(ProviderEntry::Openai {
                api_key,
                model: get("OPENAI_MODEL").map(|m| resolve_model_alias(&m).to_string()),
                base_url: get("OPENAI_API_BASE"),
                name: Some("OpenAI (Environment)".to_string()),
            });
        }

        if let (Some(api_key), Some(base_url), Some(deployment)) = (
            get("AZURE_API_KEY"),
            get("AZURE_API_URL"),
            get("AZURE_ENGINE_NAME"),
        ) {
            entries.push(ProviderEntry::Azure {
                api_key,
                base_url,
                deployment,
                api_version: get("AZURE_API_VERSION").unwrap_or_else(default_azure_api_version),
                name: Some("Azure (Environment)".to_string()),
            });
        }

        entries
    }
}

/// Named model presets. Unknown names pass through unchanged.
pub fn resolve_model_alias(name: &str) -> &str {
    match name.to_ascii_lowercase().as_str() {
        "gpt4" | "gpt-4" => "gpt-4o-2024-11-20",
        "chatgpt" => "gpt-3.5-turbo",
        _ => name,
    }
}
