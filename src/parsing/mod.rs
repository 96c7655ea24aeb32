// Parsing helpers for semi-structured model output
//
// Models answer in loosely tagged text, fenced code and free prose. These
// helpers turn that into values the pipeline can rely on.

pub mod code_block;
pub mod confidence;
pub mod structured;
pub mod tags;

pub use code_block::extract_code;
pub use confidence::{score_confidence, DEFAULT_CONFIDENCE};
pub use structured::{render, Mapping, Node, ParseError, StructuredParser, CONTAINER_TAG};
pub use tags::{normalize_tag, normalize_tags};
