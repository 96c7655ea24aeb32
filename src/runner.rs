// Batch runner
//
// Solves each problem in turn and appends one record per problem to the
// results store. Problems already in the store are skipped.

use anyhow::Result;

use crate::dataset::Problem;
use crate::results::{OutcomeRecord, ResultStore, ResultSummary};
use crate::solver::{RunCounters, Solver};

/// Solve every problem not yet recorded in `store`.
///
/// A problem that aborts with an error is recorded as failed (empty code)
/// and the run moves on. Only store I/O errors stop the batch.
pub async fn run_problems(
    solver: &Solver,
    problems: &[Problem],
    store: &mut ResultStore,
) -> Result<ResultSummary> {
    let pending: Vec<&Problem> = problems
        .iter()
        .filter(|p| !store.contains(&p.id))
        .collect();

    if pending.len() < problems.len() {
        tracing::info!(
            "Skipping {} problem(s) already in {}",
            problems.len() - pending.len(),
            store.path().display()
        );
    }

    for (idx, problem) in pending.iter().enumerate() {
        tracing::info!("[{}/{}] {}", idx + 1, pending.len(), problem.id);

        let mut counters = RunCounters::default();
        let record = match solver.solve_with_counters(problem, &mut counters).await {
            Ok(outcome) => OutcomeRecord::from_outcome(problem.id.clone(), outcome),
            Err(e) => {
                tracing::error!("{}: {}", problem.id, e);
                OutcomeRecord::failed(problem.id.clone(), counters, e.to_string())
            }
        };

        store.add(record)?;

        let summary = store.summary();
        tracing::info!(
            "Running accuracy: {}/{} ({:.2}%)",
            summary.passed,
            summary.total,
            summary.accuracy * 100.0
        );
    }

    Ok(store.summary())
}
