// Solver
//
// Runs one problem end to end: planning, ranking, then code generation and
// test-driven repair for each plan until one passes.

pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod repair;
pub mod stage;

pub use error::SolveError;
pub use orchestrator::{rank_plans, PlanAttempt, SolveOutcome, Solver};
pub use repair::{RepairLoop, RepairOutcome};
pub use stage::{complete_stage, RunCounters, Stage};
