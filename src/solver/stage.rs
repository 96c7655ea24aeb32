// Pipeline stages and the per-problem call accounting shared by all of them

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{SolverConfig, StageTemperatures};
use crate::providers::{CompletionRequest, LlmProvider, Usage};

use super::error::SolveError;

/// The kind of completion call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Retrieval,
    Planning,
    Verification,
    Coding,
    Repair,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Retrieval => "retrieval",
            Stage::Planning => "planning",
            Stage::Verification => "verification",
            Stage::Coding => "coding",
            Stage::Repair => "repair",
        }
    }

    /// Configured temperature override, if any
    pub fn temperature(self, temperatures: &StageTemperatures) -> Option<f32> {
        match self {
            Stage::Retrieval => temperatures.retrieval,
            Stage::Planning => temperatures.planning,
            Stage::Verification => temperatures.verification,
            Stage::Coding => temperatures.coding,
            Stage::Repair => temperatures.repair,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calls and tokens spent on one problem. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub api_calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl RunCounters {
    pub fn record(&mut self, usage: &Usage) {
        self.api_calls += 1;
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
    }

    pub fn budget_exhausted(&self, config: &SolverConfig) -> bool {
        config
            .max_api_calls
            .is_some_and(|limit| self.api_calls >= u64::from(limit))
    }
}

/// One completion call for `stage`: checks the call budget, applies the
/// stage temperature, and records usage in `counters`.
pub async fn complete_stage(
    provider: &dyn LlmProvider,
    config: &SolverConfig,
    stage: Stage,
    prompt: String,
    counters: &mut RunCounters,
) -> Result<String, SolveError> {
    if counters.budget_exhausted(config) {
        let limit = config.max_api_calls.unwrap_or_default();
        tracing::warn!("API call budget of {} reached before {} call", limit, stage);
        return Err(SolveError::BudgetExhausted { limit });
    }

    tracing::debug!("{} prompt:\n{}", stage, prompt);

    let request =
        CompletionRequest::user(prompt).with_temperature(stage.temperature(&config.temperatures));
    let completion = provider
        .complete(&request)
        .await
        .map_err(|source| SolveError::Provider { stage, source })?;

    counters.record(&completion.usage);
    tracing::debug!("{} response:\n{}", stage, completion.text);

    Ok(completion.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut counters = RunCounters::default();
        counters.record(&Usage {
            prompt_tokens: 10,
            completion_tokens: 4,
        });
        counters.record(&Usage {
            prompt_tokens: 1,
            completion_tokens: 1,
        });
        assert_eq!(
            counters,
            RunCounters {
                api_calls: 2,
                prompt_tokens: 11,
                completion_tokens: 5
            }
        );
    }

    #[test]
    fn test_budget() {
        let mut config = SolverConfig::default();
        let counters = RunCounters {
            api_calls: 3,
            ..Default::default()
        };
        assert!(!counters.budget_exhausted(&config));
        config.max_api_calls = Some(4);
        assert!(!counters.budget_exhausted(&config));
        config.max_api_calls = Some(3);
        assert!(counters.budget_exhausted(&config));
    }

    #[test]
    fn test_stage_temperature() {
        let temperatures = StageTemperatures {
            verification: Some(0.0),
            ..Default::default()
        };
        assert_eq!(Stage::Verification.temperature(&temperatures), Some(0.0));
        assert_eq!(Stage::Coding.temperature(&temperatures), None);
        assert_eq!(Stage::Repair.to_string(), "repair");
    }
}
