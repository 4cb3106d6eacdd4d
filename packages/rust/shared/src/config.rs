//! Application configuration for SpeakerScout.
//!
//! User config lives at `~/.speakerscout/speakerscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "speakerscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".speakerscout";

// ---------------------------------------------------------------------------
// Enumerated settings
// ---------------------------------------------------------------------------

/// Which keyword-matching policy the pipeline is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// Three-criteria matching over Class A / Class B keywords.
    #[default]
    Classified,
    /// Single flat keyword list with the older retention rules.
    Legacy,
}

impl FromStr for KeywordMode {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classified" => Ok(Self::Classified),
            "legacy" => Ok(Self::Legacy),
            other => Err(ScoutError::config(format!(
                "unknown keyword mode '{other}' (expected classified or legacy)"
            ))),
        }
    }
}

impl std::fmt::Display for KeywordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Classified => "classified",
            Self::Legacy => "legacy",
        })
    }
}

/// What a run does when the explanation collaborator fails for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationFailurePolicy {
    /// Record the error on the row and keep going.
    #[default]
    Isolate,
    /// Fail the whole run on the first error.
    Abort,
}

impl FromStr for ExplanationFailurePolicy {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(Self::Isolate),
            "abort" => Ok(Self::Abort),
            other => Err(ScoutError::config(format!(
                "unknown explanation failure policy '{other}' (expected isolate or abort)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Config structs (matching speakerscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Reference table locations.
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Location filter settings.
    #[serde(default)]
    pub location: LocationConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub keyword_mode: KeywordMode,

    /// Size of the bounded worker pool for explanation calls.
    #[serde(default = "default_explanation_concurrency")]
    pub explanation_concurrency: usize,

    #[serde(default)]
    pub on_explanation_error: ExplanationFailurePolicy,

    /// Label handed to the explainer when no event location is given.
    #[serde(default = "default_event_location_fallback")]
    pub event_location_fallback: String,

    /// libSQL database holding the explanation cache and run history.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            keyword_mode: KeywordMode::default(),
            explanation_concurrency: default_explanation_concurrency(),
            on_explanation_error: ExplanationFailurePolicy::default(),
            event_location_fallback: default_event_location_fallback(),
            cache_path: default_cache_path(),
        }
    }
}

fn default_explanation_concurrency() -> usize {
    4
}
fn default_event_location_fallback() -> String {
    "Global/EU".into()
}
fn default_cache_path() -> String {
    "~/.speakerscout/speakerscout.db".into()
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for keyword extraction and explanations.
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

/// `[reference]` section: where the three lookup tables live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default)]
    pub excluded_companies: Option<String>,

    #[serde(default)]
    pub category_a: Option<String>,

    #[serde(default)]
    pub category_b: Option<String>,

    #[serde(default)]
    pub columns: ReferenceColumns,
}

/// Key columns inside the JSON reference tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceColumns {
    #[serde(default = "default_excluded_column")]
    pub excluded: String,

    #[serde(default = "default_category_column")]
    pub category: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            excluded: default_excluded_column(),
            category: default_category_column(),
        }
    }
}

fn default_excluded_column() -> String {
    "Account Name".into()
}
fn default_category_column() -> String {
    "company".into()
}

/// `[location]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Countries always added to the working country set.
    #[serde(default)]
    pub additional_countries: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub topic: String,
    pub subtopic: String,
    /// Event location; `None` or blank means "no event location".
    pub event_location: Option<String>,
    pub additional_countries: Vec<String>,
    pub keyword_mode: KeywordMode,
    /// Worker pool size for explanation calls. Zero is treated as one.
    pub explanation_concurrency: usize,
    pub on_explanation_error: ExplanationFailurePolicy,
    pub event_location_fallback: String,
}

impl PipelineConfig {
    /// Event location if set and non-blank.
    pub fn event_location(&self) -> Option<&str> {
        self.event_location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Location label handed to the explainer.
    pub fn explanation_location(&self) -> &str {
        self.event_location()
            .unwrap_or(&self.event_location_fallback)
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            topic: String::new(),
            subtopic: String::new(),
            event_location: None,
            additional_countries: config.location.additional_countries.clone(),
            keyword_mode: config.defaults.keyword_mode,
            explanation_concurrency: config.defaults.explanation_concurrency,
            on_explanation_error: config.defaults.on_explanation_error,
            event_location_fallback: config.defaults.event_location_fallback.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.speakerscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.speakerscout/speakerscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| ScoutError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the OpenRouter API key env var is set and non-empty, returning it.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ScoutError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable, \
             or pass --offline to run without it."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("explanation_concurrency"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("Account Name"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
keyword_mode = "legacy"
on_explanation_error = "abort"

[location]
additional_countries = ["Canada"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.keyword_mode, KeywordMode::Legacy);
        assert_eq!(
            config.defaults.on_explanation_error,
            ExplanationFailurePolicy::Abort
        );
        assert_eq!(config.defaults.explanation_concurrency, 4);
        assert_eq!(config.reference.columns.category, "company");
        assert_eq!(config.location.additional_countries, vec!["Canada"]);
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.keyword_mode, KeywordMode::Classified);
        assert_eq!(pipeline.on_explanation_error, ExplanationFailurePolicy::Isolate);
        assert_eq!(pipeline.explanation_location(), "Global/EU");
    }

    #[test]
    fn blank_event_location_is_absent() {
        let mut pipeline = PipelineConfig::default();
        pipeline.event_location = Some("   ".into());
        assert_eq!(pipeline.event_location(), None);
        pipeline.event_location = Some(" Germany ".into());
        assert_eq!(pipeline.explanation_location(), "Germany");
    }

    #[test]
    fn enum_settings_parse() {
        assert_eq!("Legacy".parse::<KeywordMode>().unwrap(), KeywordMode::Legacy);
        assert!("fuzzy".parse::<KeywordMode>().is_err());
        assert_eq!(
            "abort".parse::<ExplanationFailurePolicy>().unwrap(),
            ExplanationFailurePolicy::Abort
        );
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        config.openrouter.api_key_env = "SPEAKERSCOUT_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
