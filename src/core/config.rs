//! Settings, layered from lowest to highest precedence: built-in defaults,
//! `~/.tenancy-architect/config.toml`, environment variables, `--model`.
//!
//! The first run writes a fully commented-out config file listing every key.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::inference::providers::gemini::DEFAULT_GEMINI_BASE_URL;
use crate::inference::types::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use crate::inference::GenerationConfig;

// Every field is optional so a partial file parses.

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ArchitectConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const CONFIG_DIR: &str = ".tenancy-architect";

// ============================================================================
// Resolved Config (concrete values, no Options except the credential)
// ============================================================================

#[derive(Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub generation: GenerationConfig,
    /// `None` when no credential was found anywhere; the session then fails to start.
    pub api_key: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("model_name", &self.model_name)
            .field("generation", &self.generation)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.tenancy-architect/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR).join("config.toml"))
}

/// Reads the user's config file. A missing file is created from the
/// commented template and yields defaults; a malformed one is an error.
pub fn load_config() -> Result<ArchitectConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("No home directory; running with built-in settings");
            return Ok(ArchitectConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ArchitectConfig, ConfigError> {
    if !path.exists() {
        info!("Writing config template to {}", path.display());
        generate_default_config(path);
        return Ok(ArchitectConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ArchitectConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!(
        "Config: model={:?}, temperature={:?}, max_output_tokens={:?}, api_key set={}, base_url={:?}",
        config.general.model,
        config.general.temperature,
        config.general.max_output_tokens,
        config.gemini.api_key.is_some(),
        config.gemini.base_url
    );
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Tenancy Architect Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "gemini-2.5-flash"         # Or set GEMINI_MODEL, or pass --model
# temperature = 0.7
# max_output_tokens = 4000

# [gemini]
# api_key = "..."                    # Or set GEMINI_API_KEY / API_KEY
# base_url = "https://generativelanguage.googleapis.com/v1beta"
"#;

fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Cannot create {}: {e}", parent.display());
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Cannot write config template: {e}");
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Collapses every layer into the settings the app runs with.
/// `cli_model` is the `--model` flag, if given.
pub fn resolve(config: &ArchitectConfig, cli_model: Option<&str>) -> ResolvedConfig {
    resolve_with_env(config, cli_model, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
/// Blank values count as unset.
pub fn resolve_with_env<E>(config: &ArchitectConfig, cli_model: Option<&str>, env: E) -> ResolvedConfig
where
    E: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    // Model: CLI → env → config → default
    let model_name = cli_model
        .map(|s| s.to_string())
        .or_else(|| env("GEMINI_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // API key: GEMINI_API_KEY → API_KEY → config
    let api_key = env("GEMINI_API_KEY")
        .or_else(|| env("API_KEY"))
        .or_else(|| config.gemini.api_key.clone())
        .filter(|k| !k.trim().is_empty());

    // Base URL: env → config → default
    let base_url = env("GEMINI_BASE_URL")
        .or_else(|| config.gemini.base_url.clone())
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

    ResolvedConfig {
        model_name,
        generation: GenerationConfig {
            temperature: config.general.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: config
                .general
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        },
        api_key,
        base_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ArchitectConfig::default(), None, env_of(&[]));
        assert_eq!(resolved.model_name, DEFAULT_MODEL);
        assert_eq!(resolved.generation, GenerationConfig::default());
        assert_eq!(resolved.base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(resolved.api_key.is_none());
    }

    #[test]
    fn test_gemini_api_key_wins_over_generic_key() {
        let env = env_of(&[("GEMINI_API_KEY", "primary"), ("API_KEY", "fallback")]);
        let resolved = resolve_with_env(&ArchitectConfig::default(), None, env);
        assert_eq!(resolved.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_generic_key_is_used_when_gemini_key_blank() {
        let env = env_of(&[("GEMINI_API_KEY", "  "), ("API_KEY", "fallback")]);
        let resolved = resolve_with_env(&ArchitectConfig::default(), None, env);
        assert_eq!(resolved.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_env_key_wins_over_config_file() {
        let config = ArchitectConfig {
            gemini: GeminiConfig {
                api_key: Some("from-file".to_string()),
                base_url: None,
            },
            ..Default::default()
        };
        let from_file = resolve_with_env(&config, None, env_of(&[]));
        assert_eq!(from_file.api_key.as_deref(), Some("from-file"));

        let from_env = resolve_with_env(&config, None, env_of(&[("API_KEY", "from-env")]));
        assert_eq!(from_env.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_cli_model_wins() {
        let config = ArchitectConfig {
            general: GeneralConfig {
                model: Some("file-model".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = env_of(&[("GEMINI_MODEL", "env-model")]);
        assert_eq!(resolve_with_env(&config, None, &env).model_name, "env-model");
        assert_eq!(
            resolve_with_env(&config, Some("cli-model"), &env).model_name,
            "cli-model"
        );
    }

    #[test]
    fn test_toml_values_override_defaults() {
        let toml_str = r#"
[general]
model = "gemini-2.5-pro"
temperature = 0.2
max_output_tokens = 1024

[gemini]
api_key = "test-key"
base_url = "http://localhost:8080/v1beta"
"#;
        let config: ArchitectConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, None, env_of(&[]));
        assert_eq!(resolved.model_name, "gemini-2.5-pro");
        assert_eq!(resolved.generation.temperature, 0.2);
        assert_eq!(resolved.generation.max_output_tokens, 1024);
        assert_eq!(resolved.api_key.as_deref(), Some("test-key"));
        assert_eq!(resolved.base_url, "http://localhost:8080/v1beta");
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: ArchitectConfig = toml::from_str("[general]\nmodel = \"m\"\n").unwrap();
        assert_eq!(config.general.model.as_deref(), Some("m"));
        assert!(config.general.temperature.is_none());
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_generated_default_parses_as_empty() {
        let config: ArchitectConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.general.model.is_none());
        assert!(config.gemini.base_url.is_none());
    }

    #[test]
    fn test_missing_file_is_generated() {
        let dir = std::env::temp_dir().join(format!(
            "tenancy-architect-config-{}",
            std::process::id()
        ));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = load_config_from(&path).unwrap();
        assert!(config.general.model.is_none());
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!(
            "tenancy-architect-bad-config-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nmodel = ").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let resolved = resolve_with_env(
            &ArchitectConfig::default(),
            None,
            env_of(&[("GEMINI_API_KEY", "secret-value")]),
        );
        let rendered = format!("{resolved:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
