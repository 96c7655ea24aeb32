// Project-wide constants
//
// Centralised here so sampling defaults and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Exemplars requested during retrieval.
pub const DEFAULT_K: usize = 3;

/// Sample-test evaluations allowed per plan.
pub const DEFAULT_T: usize = 5;

/// Confidence assigned to a plan whose score cannot be read.
pub const DEFAULT_CONFIDENCE: u8 = crate::parsing::DEFAULT_CONFIDENCE;

pub const DEFAULT_LANGUAGE: &str = "Python3";

pub const DEFAULT_TEMPERATURE: f32 = 0.32;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Wall-clock limit for one sample-test run.
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 10;

/// Config file location, relative to the home directory.
pub const CONFIG_RELATIVE_PATH: &str = ".blueprint/config.toml";
