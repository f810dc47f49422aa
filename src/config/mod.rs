use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::QuizError;

/// Values shipped in sample `.env` files that must never be sent as a credential
const PLACEHOLDER_KEYS: &[&str] = &[
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX",
    "your_actual_deepseek_api_key_here",
    "your_deepseek_api_key_here",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completion API settings
    pub api: ApiConfig,

    /// Source text settings
    pub source: SourceConfig,

    /// Export settings
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Chat-completion endpoint
    pub endpoint: String,

    /// Model identifiers, tried in order
    pub models: Vec<String>,

    /// Sampling temperature for the ordered models
    pub temperature: f32,

    /// Model used for the last-chance retry after every listed model failed
    pub fallback_model: String,

    /// Temperature for the last-chance retry
    pub fallback_temperature: f32,

    /// Completion token budget
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Preferred caption language
    pub caption_language: String,

    /// Characters of source text included in the prompt
    pub max_prompt_chars: usize,

    /// yt-dlp executable
    pub yt_dlp_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the download artifacts are written to
    pub output_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            models: vec![
                "deepseek-chat".to_string(),
                "deepseek-coder".to_string(),
                "deepseek-chat-33b".to_string(),
                "deepseek-chat-6.7b".to_string(),
                "deepseek-chat-1.3b".to_string(),
            ],
            temperature: 0.7,
            fallback_model: "deepseek-chat".to_string(),
            fallback_temperature: 0.9,
            max_tokens: 4000,
            timeout_secs: 60,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            caption_language: "en".to_string(),
            max_prompt_chars: 4000,
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::existing_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Write the current settings to the user config path
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::user_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Config file in use, if any
    pub fn existing_config_path() -> Option<PathBuf> {
        // Current directory first for easy testing
        let local_config = PathBuf::from("quizgen.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        Self::user_config_path().ok().filter(|path| path.exists())
    }

    fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("quizgen").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.models.is_empty() {
            anyhow::bail!("At least one model must be configured under api.models");
        }

        if self.api.endpoint.is_empty() {
            anyhow::bail!("api.endpoint must be configured");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than zero");
        }

        if self.source.max_prompt_chars == 0 {
            anyhow::bail!("source.max_prompt_chars must be greater than zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self, api_key: Option<&str>) {
        println!("Current Configuration:");
        match Self::existing_config_path() {
            Some(path) => println!("  Config File: {}", path.display()),
            None => println!("  Config File: (defaults)"),
        }
        println!("  Endpoint: {}", self.api.endpoint);
        println!("  Models: {}", self.api.models.join(", "));
        println!(
            "  Fallback: {} (temperature {})",
            self.api.fallback_model, self.api.fallback_temperature
        );
        println!("  Max Tokens: {}", self.api.max_tokens);
        println!("  Timeout: {}s", self.api.timeout_secs);
        println!("  Caption Language: {}", self.source.caption_language);
        println!("  Prompt Characters: {}", self.source.max_prompt_chars);
        println!("  Output Directory: {}", self.export.output_dir.display());

        match ApiKey::resolve(api_key) {
            Ok(key) => println!("  API Key: configured ({} characters)", key.len()),
            Err(e) => println!("  API Key: {}", e),
        }
    }
}

/// A validated chat-completion credential
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Accept a raw key, rejecting missing, blank, and placeholder values
    pub fn resolve(raw: Option<&str>) -> std::result::Result<Self, QuizError> {
        let key = raw.map(str::trim).unwrap_or_default();

        if key.is_empty() {
            return Err(QuizError::MissingApiKey);
        }

        if PLACEHOLDER_KEYS.contains(&key) {
            return Err(QuizError::PlaceholderApiKey);
        }

        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<{} chars>)", self.len())
    }
}
