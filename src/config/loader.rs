// Configuration loader
// Loads settings from ~/.blueprint/config.toml or environment variables

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::CONFIG_RELATIVE_PATH;
use super::provider::ProviderEntry;
use super::settings::Config;

/// Default config file location
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_RELATIVE_PATH))
}

/// Load configuration.
///
/// An explicit `path` must exist. Otherwise `~/.blueprint/config.toml` is read
/// when present. Providers missing from the file are taken from the environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_from_file(path)?,
        None => {
            let default_path = default_config_path()?;
            if default_path.exists() {
                load_from_file(&default_path)?
            } else {
                tracing::debug!("No config at {}; using defaults", default_path.display());
                Config::default()
            }
        }
    };

    finish(config, |key| std::env::var(key).ok())
}

/// Parse a TOML config file.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

fn finish<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if config.providers.is_empty() {
        config.providers = ProviderEntry::from_env_vars(lookup);
    }

    if config.providers.is_empty() {
        bail!(
            "No provider configured.\n\n\
            Add a [[providers]] entry to ~/.blueprint/config.toml, or set:\n  \
            export OPENAI_API_KEY=\"sk-...\"\n\
            or for Azure:\n  \
            export AZURE_API_KEY=... AZURE_API_URL=... AZURE_ENGINE_NAME=..."
        );
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[providers]]
type = "openai"
api_key = "sk-file"
model = "gpt-4o-mini"

[solver]
t = 2
max_api_calls = 40

[retry]
max_attempts = 3
"#
        )
        .unwrap();

        let config = finish(load_from_file(file.path()).unwrap(), no_env).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].api_key(), "sk-file");
        assert_eq!(config.solver.t, 2);
        assert_eq!(config.solver.max_api_calls, Some(40));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.min_delay_ms, 1_000);
    }

    #[test]
    fn test_env_fallback_when_file_has_no_providers() {
        let config = finish(Config::default(), |key| {
            (key == "OPENAI_API_KEY").then(|| "sk-env".to_string())
        })
        .unwrap();
        assert_eq!(config.providers[0].api_key(), "sk-env");
    }

    #[test]
    fn test_no_provider_is_an_error() {
        let err = finish(Config::default(), no_env).unwrap_err();
        assert!(err.to_string().contains("No provider configured"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[providers]]\ntype = \"openai\"\napi_key = \"sk\"\n\n[solver]\nk = 0\n"
        )
        .unwrap();
        let config = load_from_file(file.path()).unwrap();
        assert!(finish(config, no_env).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[solver\nk = ").unwrap();
        let err = load_from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
