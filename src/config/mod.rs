// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod provider;
mod settings;

pub use loader::{default_config_path, load_config, load_from_file};
pub use provider::{resolve_model_alias, ProviderEntry};
pub use settings::{
    Config, EvaluatorConfig, LanguageCommand, RetryConfig, SamplingParams, SolverConfig,
    StageTemperatures,
};
