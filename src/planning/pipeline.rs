// Plan pipeline: exemplar retrieval, per-exemplar planning, plan verification

use crate::config::SolverConfig;
use crate::dataset::{render_sample_io, Dataset, Problem};
use crate::parsing::{normalize_tags, score_confidence, Node, StructuredParser};
use crate::providers::LlmProvider;
use crate::solver::{complete_stage, RunCounters, SolveError, Stage};

use super::prompts::{
    planning_prompt, retrieval_prompt, sample_io_section, verification_prompt, EXEMPLAR_TAG,
    RETRIEVAL_TEXT_TAGS, VERIFICATION_TEXT_TAGS,
};
use super::types::{field_text, Exemplar, Plan, PlanningOutput, RawExemplar, SharedContext};

/// Produces scored plans for one problem. Borrowed collaborators only; all
/// per-problem state lives in the `RunCounters` passed to `run`.
pub struct PlanPipeline<'a> {
    provider: &'a dyn LlmProvider,
    dataset: &'a dyn Dataset,
    config: &'a SolverConfig,
}

impl<'a> PlanPipeline<'a> {
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

    /// Retrieve exemplars, then plan and verify once per exemplar.
    ///
    /// Costs `1 + 2 * exemplars` completion calls. Plans come back in
    /// exemplar order.
    pub async fn run(
        &self,
        problem: &Problem,
        counters: &mut RunCounters,
    ) -> Result<PlanningOutput, SolveError> {
        let problem_text = self.dataset.prompt(problem);

        // ── 1. Retrieval ─────────────────────────────────────────────
        let response = complete_stage(
            self.provider,
            self.config,
            Stage::Retrieval,
            retrieval_prompt(&problem_text, self.config.k, &self.config.language),
            counters,
        )
        .await?;
        let (exemplars, context) = parse_retrieval(&response, self.config.k)?;
        tracing::info!("{}: retrieved {} exemplar(s)", problem.id, exemplars.len());

        let sample_io = sample_io_section(&render_sample_io(&problem.sample_io));
        let mut plans = Vec::with_capacity(exemplars.len());

        for (idx, exemplar) in exemplars.into_iter().enumerate() {
            // ── 2. Planning ──────────────────────────────────────────
            let plan_text = complete_stage(
                self.provider,
                self.config,
                Stage::Planning,
                planning_prompt(&exemplar, &context, &problem_text, &sample_io),
                counters,
            )
            .await?;

            // ── 3. Verification ──────────────────────────────────────
            let verdict = complete_stage(
                self.provider,
                self.config,
                Stage::Verification,
                verification_prompt(&problem_text, &plan_text),
                counters,
            )
            .await?;
            let confidence = parse_verification(&verdict, self.config.default_confidence);

            tracing::info!(
                "{}: plan {} from exemplar scored {}",
                problem.id,
                idx + 1,
                confidence
            );

            plans.push(Plan {
                text: plan_text,
                confidence,
                exemplar,
            });
        }

        Ok(PlanningOutput { plans, context })
    }
}

/// Exemplars (at most `k`) and shared context from a retrieval response.
pub fn parse_retrieval(
    response: &str,
    k: usize,
) -> Result<(Vec<Exemplar>, SharedContext), SolveError> {
    let normalized = normalize_tags(response, &RETRIEVAL_TEXT_TAGS);
    let fields = StructuredParser::new()
        .repeated(EXEMPLAR_TAG)
        .parse(&normalized)
        .map_err(|source| SolveError::Malformed {
            stage: Stage::Retrieval,
            source,
        })?;

    let exemplars: Vec<Exemplar> = match fields.get(EXEMPLAR_TAG) {
        Some(Node::List(items)) => items
            .iter()
            .filter_map(RawExemplar::from_node)
            .map(RawExemplar::normalize)
            .take(k)
            .collect(),
        _ => Vec::new(),
    };

    if exemplars.is_empty() {
        return Err(SolveError::NoExemplars);
    }

    let context = SharedContext {
        algorithm: field_text(&fields, "algorithm"),
        learned_techniques: field_text(&fields, "learned_techniques"),
    };

    Ok((exemplars, context))
}

/// Confidence from a verification response.
///
/// Confidence only orders plans, so a response without usable tags is scored
/// from its raw text instead of aborting the problem.
pub fn parse_verification(response: &str, default_confidence: u8) -> u8 {
    let normalized = normalize_tags(response, &VERIFICATION_TEXT_TAGS);
    let fields = match StructuredParser::new().parse(&normalized) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!("Verification response is not structured ({}); scoring raw text", e);
            return score_confidence(Some(response), default_confidence);
        }
    };

    if let Some(analysis) = fields.get("analysis").and_then(Node::as_text) {
        tracing::debug!("Plan analysis: {}", analysis);
    }

    score_confidence(
        fields.get("confidence").and_then(Node::as_text),
        default_confidence,
    )
}
