// Planning
//
// Turns a problem into several candidate plans. One retrieval call recalls
// related problems plus an algorithm tutorial; each recalled problem then
// seeds one plan, which the model scores for confidence.

pub mod pipeline;
pub mod prompts;
pub mod types;

pub use pipeline::{parse_retrieval, parse_verification, PlanPipeline};
pub use types::{Exemplar, Plan, PlanningOutput, RawExemplar, SharedContext};
