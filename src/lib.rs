// Blueprint - plan-ranked, test-repaired code synthesis
// Library exports

pub mod config;
pub mod dataset;
pub mod parsing;
pub mod planning;
pub mod providers;
pub mod results;
pub mod runner;
pub mod solver;

pub use dataset::{Dataset, Problem, SampleIo, TestVerdict};
pub use providers::LlmProvider;
pub use solver::{SolveError, SolveOutcome, Solver};
