// Errors that abort solving a problem

use crate::parsing::ParseError;
use crate::providers::ProviderError;

use super::stage::Stage;

/// Failing to find a passing program is not an error; see `SolveOutcome::passed`.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("{stage} call failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("could not parse {stage} response: {source}")]
    Malformed {
        stage: Stage,
        #[source]
        source: ParseError,
    },

    #[error("retrieval produced no exemplar problems")]
    NoExemplars,

    #[error("API call budget of {limit} exhausted")]
    BudgetExhausted { limit: u32 },
}
