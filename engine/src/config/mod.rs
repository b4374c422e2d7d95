//! Configuration management
//!
//! This module handles loading, validation, and management of the Regent configuration.
//! Configuration is stored in TOML format at ~/.regent/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: Reasoning backend providers and per-call timeout
//! - **exploration**: Corpus/results locations, time budget, document size cap
//! - **report**: Output languages, reflection and translation switches
//!
//! # Examples
//!
//! ```no_run
//! use regent_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Time budget: {:?}", config.exploration.time_budget());
//! println!("Default provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Providers the engine knows how to construct
pub const VALID_PROVIDERS: [&str; 3] = ["ollama", "openai", "anthropic"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Exploration loop settings
    #[serde(default)]
    pub exploration: ExplorationConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (ollama, openai, anthropic)
    pub default_provider: String,

    /// Upper bound for a single backend call in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key comes from OPENAI_API_KEY or the OS keychain, not from config
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    // Note: API key comes from ANTHROPIC_API_KEY or the OS keychain, not from config
}

/// Exploration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Root holding one directory per experiment (`<templates_dir>/<experiment>/data`)
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Root receiving one report directory per experiment
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Time Guard budget for the whole exploration loop, in seconds
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,

    /// Extracted document text is truncated to this many characters
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,

    /// File name of the persisted corpus index inside the experiment directory
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,
}

impl ExplorationConfig {
    /// Time Guard budget as a `Duration`
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    /// Directory holding the experiment's data and corpus index
    pub fn experiment_dir(&self, experiment: &str) -> PathBuf {
        self.templates_dir.join(experiment)
    }

    /// Directory receiving the experiment's reports
    pub fn results_dir_for(&self, experiment: &str) -> PathBuf {
        self.results_dir.join(experiment)
    }
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            results_dir: default_results_dir(),
            time_budget_secs: default_time_budget_secs(),
            max_document_chars: default_max_document_chars(),
            index_file_name: default_index_file_name(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Ordered language codes; the first one is the primary language
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Run one clarity/formatting refinement pass over each variant
    #[serde(default = "default_true")]
    pub reflection: bool,

    /// Translate free-text rationale into non-primary languages
    #[serde(default = "default_true")]
    pub translate: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            reflection: true,
            translate: true,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_call_timeout_secs() -> u64 {
    300
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-2024-11-20".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_time_budget_secs() -> u64 {
    900
}

fn default_max_document_chars() -> usize {
    60_000
}

fn default_index_file_name() -> String {
    "corpus_index.txt".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["ja".to_string(), "en".to_string()]
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            call_timeout_secs: default_call_timeout_secs(),
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.regent/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.regent/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".regent").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
            },
            llm: LLMConfig::default(),
            exploration: ExplorationConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates enumerated values and numeric ranges
    /// - Requires at least two distinct report languages
    /// - Expands ~ in paths
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if self.llm.call_timeout_secs == 0 {
            return Err(EngineError::Config(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.exploration.time_budget_secs == 0 {
            return Err(EngineError::Config(
                "time_budget_secs must be greater than 0".to_string(),
            ));
        }

        if self.exploration.max_document_chars == 0 {
            return Err(EngineError::Config(
                "max_document_chars must be greater than 0".to_string(),
            ));
        }

        if self.exploration.index_file_name.trim().is_empty() {
            return Err(EngineError::Config(
                "index_file_name must not be empty".to_string(),
            ));
        }

        let mut languages: Vec<String> = Vec::with_capacity(self.report.languages.len());
        for code in &self.report.languages {
            let code = code.trim().to_ascii_lowercase();
            if code.is_empty() {
                return Err(EngineError::Config(
                    "report.languages must not contain empty codes".to_string(),
                ));
            }
            if !languages.contains(&code) {
                languages.push(code);
            }
        }
        if languages.len() < 2 {
            return Err(EngineError::Config(
                "report.languages must list at least two distinct languages".to_string(),
            ));
        }
        self.report.languages = languages;

        self.exploration.templates_dir = expand_path(&self.exploration.templates_dir)?;
        self.exploration.results_dir = expand_path(&self.exploration.results_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[core]
log_level = "debug"

[llm]
default_provider = "ollama"
"#;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.default_provider, "openai");
        assert_eq!(config.exploration.time_budget_secs, 900);
        assert_eq!(config.report.languages, vec!["ja", "en"]);
        assert!(config.report.reflection);
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.exploration.time_budget(), Duration::from_secs(900));
        assert_eq!(config.exploration.index_file_name, "corpus_index.txt");
        assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.llm.call_timeout_secs, 300);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = Config::from_toml_str("[core]\n[llm]\ndefault_provider = \"gemini\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid default provider"));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let toml = format!("{}\n[exploration]\ntime_budget_secs = 0\n", MINIMAL);
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("time_budget_secs"));
    }

    #[test]
    fn test_languages_are_normalized_and_need_two() {
        let toml = format!("{}\n[report]\nlanguages = [\"EN\", \"en\"]\n", MINIMAL);
        assert!(Config::from_toml_str(&toml).is_err());

        let toml = format!("{}\n[report]\nlanguages = [\"EN\", \" ja \", \"en\"]\n", MINIMAL);
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.report.languages, vec!["en", "ja"]);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_experiment_paths() {
        let exploration = ExplorationConfig::default();
        assert_eq!(
            exploration.experiment_dir("internal_regulations"),
            PathBuf::from("templates/internal_regulations")
        );
        assert_eq!(
            exploration.results_dir_for("internal_regulations"),
            PathBuf::from("results/internal_regulations")
        );
    }
}
