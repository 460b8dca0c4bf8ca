use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the Gemini credential
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation backend configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Transcript retrieval settings
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (GOOGLE_API_KEY takes precedence)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Caption languages in preference order
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Timeout for each request to YouTube, in seconds
    #[serde(default = "default_transcript_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout() -> u64 {
    120
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_transcript_timeout() -> u64 {
    30
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            endpoint: default_endpoint(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            timeout_secs: default_transcript_timeout(),
        }
    }
}

impl TranscriptConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without touching the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Write the default configuration to the user config path
    pub fn init() -> Result<PathBuf> {
        let config_path = Self::user_config_path()?;
        if config_path.exists() {
            anyhow::bail!("Config file already exists: {}", config_path.display());
        }

        Self::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::user_config_path()
    }

    fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("yt-insights").join("config.yaml"))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.gemini.api_key = Some(key);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            anyhow::bail!(
                "gemini.temperature must be between 0.0 and 2.0 (got {})",
                self.gemini.temperature
            );
        }

        if self.gemini.model.trim().is_empty() {
            anyhow::bail!("gemini.model must not be empty");
        }

        if self.transcript.languages.is_empty() {
            anyhow::bail!("transcript.languages must list at least one language code");
        }

        if self.transcript.languages.iter().any(|lang| lang.trim().is_empty()) {
            anyhow::bail!("transcript.languages must not contain blank language codes");
        }

        if self.gemini.timeout_secs == 0 || self.transcript.timeout_secs == 0 {
            anyhow::bail!("Timeouts must be greater than zero seconds");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Gemini Model: {}", self.gemini.model);
        println!("  Temperature: {}", self.gemini.temperature);
        println!("  Endpoint: {}", self.gemini.endpoint);
        println!(
            "  API Key: {}",
            if self.gemini.api_key.is_some() { "set" } else { "not set" }
        );
        println!("  Transcript Languages: {}", self.transcript.languages.join(", "));
        println!("  Transcript Timeout: {}s", self.transcript.timeout_secs);
        println!("  Generation Timeout: {}s", self.gemini.timeout_secs);
    }
}
