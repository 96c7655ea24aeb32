// Repair loop: generate code for one plan, then test and fix it a bounded
// number of times

use crate::config::SolverConfig;
use crate::dataset::{render_sample_io, Dataset, Problem};
use crate::parsing::extract_code;
use crate::planning::prompts::sample_io_section;
use crate::planning::{Plan, SharedContext};
use crate::providers::LlmProvider;

use super::error::SolveError;
use super::prompts::{coding_prompt, repair_prompt, response_record};
use super::stage::{complete_stage, RunCounters, Stage};

/// Result of working one plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Last evaluated code
    pub code: String,
    pub passed: bool,
    /// Sample-test runs performed, at most `t`
    pub evaluations: usize,
}

pub struct RepairLoop<'a> {
    provider: &'a dyn LlmProvider,
    dataset: &'a dyn Dataset,
    config: &'a SolverConfig,
}

impl<'a> RepairLoop<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        dataset: &'a dyn Dataset,
        config: &'a SolverConfig,
    ) -> Self {
        Self {
            provider,
            dataset,
            config,
        }
    }

    /// Generate code from `plan` and repair it until the sample tests pass or
    /// `t` evaluations have been spent.
    ///
    /// Running out of call budget during repair ends the loop with the last
    /// evaluated code; running out before the first code exists is an error.
    pub async fn run(
        &self,
        problem: &Problem,
        plan: &Plan,
        context: &SharedContext,
        counters: &mut RunCounters,
    ) -> Result<RepairOutcome, SolveError> {
        let problem_text = self.dataset.prompt(problem);
        let language = self.config.language.as_str();
        let io_convention = self.dataset.io_convention();
        let sample_io = sample_io_section(&render_sample_io(&problem.sample_io));

        let response = complete_stage(
            self.provider,
            self.config,
            Stage::Coding,
            coding_prompt(
                &problem_text,
                &plan.text,
                &sample_io,
                context,
                language,
                io_convention,
            ),
            counters,
        )
        .await?;

        let mut code = extract_code(&response);
        let mut record = response_record(&plan.text, &code);
        let mut evaluations = 0;

        for attempt in 1..=self.config.t {
            let verdict = self
                .dataset
                .evaluate_sample_io(problem, &code, language)
                .await;
            evaluations += 1;

            if verdict.passed {
                tracing::info!("{}: sample tests passed on attempt {}", problem.id, attempt);
                return Ok(RepairOutcome {
                    code,
                    passed: true,
                    evaluations,
                });
            }

            tracing::info!(
                "{}: sample tests failed on attempt {}/{}",
                problem.id,
                attempt,
                self.config.t
            );
            tracing::debug!("Test log:\n{}", verdict.log);

            if attempt == self.config.t {
                break;
            }

            let prompt = repair_prompt(
                &problem_text,
                context,
                language,
                &record,
                &verdict.log,
                io_convention,
            );
            match complete_stage(self.provider, self.config, Stage::Repair, prompt, counters).await
            {
                Ok(response) => {
                    code = extract_code(&response);
                    record = response;
                }
                Err(SolveError::BudgetExhausted { .. }) => break,
                Err(e) => return Err(e),
            }
        }

        Ok(RepairOutcome {
            code,
            passed: false,
            evaluations,
        })
    }
}
