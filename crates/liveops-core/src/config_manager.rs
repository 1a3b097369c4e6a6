use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::LiveOpsError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for LiveOpsError {
    fn from(err: ConfigError) -> Self {
        LiveOpsError::Config(err.to_string())
    }
}

/// Main configuration for the summarizer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiveOpsConfig {
    /// Model provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model provider configuration.
///
/// Sampling temperature, token budget and the fallback model are constants of
/// the summarization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Primary model identifier (e.g., "gpt-5", "gpt-4o")
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// API base URL (default: https://api.openai.com/v1)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional organization ID
    #[serde(default)]
    pub organization: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            openai_api_key: None,
            base_url: default_base_url(),
            organization: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error", or a filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gpt-5".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with file discovery and environment overrides
#[derive(Debug)]
pub struct ConfigManager {
    config: LiveOpsConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (explicit path, ./.liveops.toml, ~/.liveops/config.toml)
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };

        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!(
            config_file = %config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "NONE (using defaults)".to_string()),
            model = %config.llm.model,
            base_url = %config.llm.base_url,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Build a manager around an already assembled configuration
    pub fn from_config(config: LiveOpsConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".liveops.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .liveops.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.liveops.toml
    /// 2. ~/.liveops/config.toml
    /// 3. Defaults
    fn load_config_file() -> Result<(LiveOpsConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".liveops.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".liveops").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((LiveOpsConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<LiveOpsConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: LiveOpsConfig) -> LiveOpsConfig {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.openai_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.llm.model = model;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(org) = std::env::var("OPENAI_ORG_ID") {
            config.llm.organization = Some(org);
        }
        if let Ok(timeout) = std::env::var("LIVEOPS_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.llm.timeout_secs = secs;
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LIVEOPS_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    fn validate_config(config: &LiveOpsConfig) -> Result<(), ConfigError> {
        if config.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }
        if config.llm.timeout_secs < 1 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_secs must be >= 1".to_string(),
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            directive if directive.contains('=') || directive.contains(',') => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &LiveOpsConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
