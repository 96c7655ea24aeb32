// Result record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::solver::{PlanAttempt, RunCounters, SolveOutcome};

/// One line of the results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub task_id: String,
    pub final_code: String,
    pub passed: bool,
    pub api_calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub plans: Vec<PlanAttempt>,
    pub recorded_at: DateTime<Utc>,
    /// Set when solving aborted with an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    pub fn from_outcome(task_id: impl Into<String>, outcome: SolveOutcome) -> Self {
        Self {
            task_id: task_id.into(),
            final_code: outcome.code,
            passed: outcome.passed,
            api_calls: outcome.counters.api_calls,
            prompt_tokens: outcome.counters.prompt_tokens,
            completion_tokens: outcome.counters.completion_tokens,
            plans: outcome.attempts,
            recorded_at: Utc::now(),
            error: None,
        }
    }

    /// Record for a problem whose solve aborted; counts usage spent so far.
    pub fn failed(task_id: impl Into<String>, counters: RunCounters, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            final_code: String::new(),
            passed: false,
            api_calls: counters.api_calls,
            prompt_tokens: counters.prompt_tokens,
            completion_tokens: counters.completion_tokens,
            plans: Vec::new(),
            recorded_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Aggregate over a results file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub passed: usize,
    /// Fraction passed, 0.0 when empty
    pub accuracy: f64,
    pub errors: usize,
    pub api_calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ResultSummary {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut summary = records.iter().fold(Self::default(), |mut s, r| {
            s.total += 1;
            s.passed += usize::from(r.passed);
            s.errors += usize::from(r.error.is_some());
            s.api_calls += r.api_calls;
            s.prompt_tokens += r.prompt_tokens;
            s.completion_tokens += r.completion_tokens;
            s
        });
        if summary.total > 0 {
            summary.accuracy = summary.passed as f64 / summary.total as f64;
        }
        summary
    }
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Solved {}/{} ({:.2}%)",
            self.passed,
            self.total,
            self.accuracy * 100.0
        )?;
        if self.errors > 0 {
            writeln!(f, "Aborted: {}", self.errors)?;
        }
        writeln!(f, "API calls: {}", self.api_calls)?;
        write!(
            f,
            "Tokens: {} prompt, {} completion",
            self.prompt_tokens, self.completion_tokens
        )
    }
}
