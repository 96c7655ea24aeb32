// Solver: plan, rank, then repair plans in order until one passes

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SolverConfig;
use crate::dataset::{Dataset, Problem};
use crate::planning::{Plan, PlanPipeline};
use crate::providers::LlmProvider;

use super::error::SolveError;
use super::repair::{RepairLoop, RepairOutcome};
use super::stage::RunCounters;

/// Trace entry for one plan that reached the repair loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAttempt {
    pub confidence: u8,
    pub evaluations: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    /// Passing code, or the last attempted code when nothing passed
    pub code: String,
    pub passed: bool,
    pub counters: RunCounters,
    /// In the order the plans were tried
    pub attempts: Vec<PlanAttempt>,
}

/// Order plans by confidence, highest first. Equal scores keep their
/// original order.
pub fn rank_plans(mut plans: Vec<Plan>) -> Vec<Plan> {
    plans.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    plans
}

pub struct Solver {
    provider: Arc<dyn LlmProvider>,
    dataset: Arc<dyn Dataset>,
    config: SolverConfig,
}

impl Solver {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        dataset: Arc<dyn Dataset>,
        config: SolverConfig,
    ) -> Self {
        Self {
            provider,
            dataset,
            config,
        }
    }

    pub async fn solve(&self, problem: &Problem) -> Result<SolveOutcome, SolveError> {
        let mut counters = RunCounters::default();
        self.solve_with_counters(problem, &mut counters).await
    }

    /// Like `solve`, but accumulates into caller-owned counters so usage is
    /// still known when solving fails.
    pub async fn solve_with_counters(
        &self,
        problem: &Problem,
        counters: &mut RunCounters,
    ) -> Result<SolveOutcome, SolveError> {
        let provider = self.provider.as_ref();
        let dataset = self.dataset.as_ref();

        tracing::info!(
            "Solving {} with {} ({}), k={}, t={}",
            problem.id,
            provider.name(),
            provider.model(),
            self.config.k,
            self.config.t
        );

        let planning = PlanPipeline::new(provider, dataset, &self.config)
            .run(problem, counters)
            .await?;
        let plans = rank_plans(planning.plans);

        let repair = RepairLoop::new(provider, dataset, &self.config);
        let mut attempts = Vec::with_capacity(plans.len());
        let mut last: Option<RepairOutcome> = None;

        for (rank, plan) in plans.iter().enumerate() {
            tracing::info!(
                "{}: trying plan {}/{} (confidence {})",
                problem.id,
                rank + 1,
                plans.len(),
                plan.confidence
            );

            let outcome = match repair.run(problem, plan, &planning.context, counters).await {
                Ok(outcome) => outcome,
                Err(SolveError::BudgetExhausted { limit }) => match last {
                    Some(_) => {
                        tracing::warn!("{}: call budget of {} spent; stopping", problem.id, limit);
                        break;
                    }
                    None => return Err(SolveError::BudgetExhausted { limit }),
                },
                Err(e) => return Err(e),
            };

            attempts.push(PlanAttempt {
                confidence: plan.confidence,
                evaluations: outcome.evaluations,
                passed: outcome.passed,
            });

            let passed = outcome.passed;
            last = Some(outcome);
            if passed {
                break;
            }
            if counters.budget_exhausted(&self.config) {
                tracing::warn!("{}: call budget spent; stopping", problem.id);
                break;
            }
        }

        // Unset only when planning produced no plans
        let Some(RepairOutcome { code, passed, .. }) = last else {
            return Err(SolveError::NoExemplars);
        };

        tracing::info!(
            "{}: {} after {} plan(s), {} API call(s)",
            problem.id,
            if passed { "solved" } else { "unsolved" },
            attempts.len(),
            counters.api_calls
        );

        Ok(SolveOutcome {
            code,
            passed,
            counters: *counters,
            attempts,
        })
    }
}
