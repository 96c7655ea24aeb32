// Results persistence
//
// One JSON line per solved (or abandoned) problem, so interrupted runs can
// resume where they stopped.

mod store;
mod types;

pub use store::ResultStore;
pub use types::{OutcomeRecord, ResultSummary};
