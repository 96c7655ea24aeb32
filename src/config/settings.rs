// Configuration structs

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::constants::*;
use super::provider::ProviderEntry;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: Option<u32>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

/// Optional temperature override per pipeline stage. Unset stages use
/// `SamplingParams::temperature`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemperatures {
    pub retrieval: Option<f32>,
    pub planning: Option<f32>,
    pub verification: Option<f32>,
    pub coding: Option<f32>,
    pub repair: Option<f32>,
}

impl StageTemperatures {
    fn all(&self) -> [(&'static str, Option<f32>); 5] {
        [
            ("retrieval", self.retrieval),
            ("planning", self.planning),
            ("verification", self.verification),
            ("coding", self.coding),
            ("repair", self.repair),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Exemplars (and therefore plans) per problem
    pub k: usize,
    /// Sample-test evaluations per plan
    pub t: usize,
    pub language: String,
    pub default_confidence: u8,
    /// Hard cap on completion calls for one problem
    pub max_api_calls: Option<u32>,
    pub temperatures: StageTemperatures,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            t: DEFAULT_T,
            language: DEFAULT_LANGUAGE.to_string(),
            default_confidence: DEFAULT_CONFIDENCE,
            max_api_calls: None,
            temperatures: StageTemperatures::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}

/// How to run a candidate program for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Source file extension, without the dot
    pub extension: String,
}

impl LanguageCommand {
    pub fn new(program: &str, extension: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            extension: extension.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Keyed by language name as passed to the solver (e.g. "Python3")
    pub commands: BTreeMap<String, LanguageCommand>,
    pub timeout_secs: u64,
    /// Problems read stdin and write stdout (APPS-style)
    pub stdio: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        let mut commands = BTreeMap::new();
        commands.insert("Python3".to_string(), LanguageCommand::new("python3", "py"));
        commands.insert("Python".to_string(), LanguageCommand::new("python3", "py"));
        commands.insert("JavaScript".to_string(), LanguageCommand::new("node", "js"));
        Self {
            commands,
            timeout_secs: DEFAULT_EVAL_TIMEOUT_SECS,
            stdio: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: Vec<ProviderEntry>,
    pub sampling: SamplingParams,
    pub solver: SolverConfig,
    pub retry: RetryConfig,
    pub evaluator: EvaluatorConfig,
}

impl Config {
    pub fn with_providers(providers: Vec<ProviderEntry>) -> Self {
        Self {
            providers,
            ..Self::default()
        }
    }

    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        for (idx, provider) in self.providers.iter().enumerate() {
            if provider.api_key().trim().is_empty() {
                bail!(
                    "Provider '{}' (providers[{}]) has an empty api_key",
                    provider.display_name(),
                    idx
                );
            }
        }

        if self.solver.k == 0 {
            bail!("solver.k must be greater than 0");
        }
        if self.solver.t == 0 {
            bail!("solver.t must be greater than 0");
        }
        if self.solver.default_confidence > 100 {
            bail!(
                "solver.default_confidence ({}) must be between 0 and 100",
                self.solver.default_confidence
            );
        }
        if self.solver.max_api_calls == Some(0) {
            bail!("solver.max_api_calls must be greater than 0 when set");
        }

        check_temperature("sampling.temperature", self.sampling.temperature)?;
        for (stage, temperature) in self.solver.temperatures.all() {
            if let Some(t) = temperature {
                check_temperature(&format!("solver.temperatures.{}", stage), t)?;
            }
        }

        if !(self.sampling.top_p > 0.0 && self.sampling.top_p <= 1.0) {
            bail!(
                "sampling.top_p ({}) must be in (0, 1]",
                self.sampling.top_p
            );
        }

        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            bail!(
                "retry.min_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.min_delay_ms,
                self.retry.max_delay_ms
            );
        }

        if self.evaluator.timeout_secs == 0 {
            bail!("evaluator.timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

fn check_temperature(field: &str, value: f32) -> anyhow::Result<()> {
    if !(0.0..=2.0).contains(&value) {
        bail!("{} ({}) must be between 0 and 2", field, value);
    }
    Ok(())
}
