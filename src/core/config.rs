//! Configuration management for pentest-crew
//!
//! Supports environment variables, a `.env` file, a config file and runtime
//! overrides from the command line.
//!
//! Config file location: ~/.config/pentest-crew/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{CrewError, Result};

/// Main configuration for pentest-crew
///
/// Every section and field is optional in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat completion backend
    pub openai: OpenAiConfig,
    /// Web search tool
    pub search: SearchConfig,
    /// Model selection per role
    pub models: ModelConfig,
    /// Agent and session behavior
    pub agent: AgentConfig,
    /// Log sinks
    pub logging: LoggingConfig,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL, without the trailing `/chat/completions`
    pub base_url: String,
    /// API key (usually supplied through OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Serper web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whether the advisor may search the web
    pub enabled: bool,
    /// API key (usually supplied through SERPER_API_KEY)
    pub api_key: Option<String>,
    pub base_url: String,
    /// Number of organic results requested per query
    pub num_results: u32,
    /// Serve repeated queries from memory
    pub cache: bool,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used by the command advisor
    pub advisor: String,
    /// Model used by the report writer
    pub reporter: String,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum reasoning iterations for the advisor
    /// Default: 25
    pub advisor_max_iter: usize,
    /// Maximum reasoning iterations for the report writer
    /// Default: 10
    pub reporter_max_iter: usize,
    /// Upper bound for a single advisor or reporter call
    /// Default: 600
    pub call_timeout_secs: u64,
    /// Word that ends the current prompt level
    pub exit_keyword: String,
    /// Log request and response bodies
    pub debug: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Process log file
    pub file: PathBuf,
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// JSON-lines file receiving every completed task output
    pub output_log_file: Option<PathBuf>,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env_secret("OPENAI_API_KEY"),
            timeout_secs: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("PENTEST_SEARCH_ENABLED", true),
            api_key: env_secret("SERPER_API_KEY"),
            base_url: "https://google.serper.dev".to_string(),
            num_results: 5,
            cache: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let model = env::var("PENTEST_MODEL").unwrap_or_else(|_| "gpt-4".to_string());
        Self {
            advisor: model.clone(),
            reporter: model,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            advisor_max_iter: 25,
            reporter_max_iter: 10,
            call_timeout_secs: 600,
            exit_keyword: "exit".to_string(),
            debug: env_flag("PENTEST_DEBUG", false),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("aws_pentest.log"),
            level: "debug".to_string(),
            output_log_file: Some(PathBuf::from("crew_output.log")),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pentest-crew")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    ///
    /// A missing config file means defaults. A config file that cannot be read
    /// or parsed is a configuration error. Credentials left out of the file
    /// are taken from the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = Self::config_file();
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::default()
        };
        config.fill_credentials_from_env();
        Ok(config)
    }

    /// Load configuration from the given file only
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CrewError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CrewError::config(format!("Failed to parse config: {}", e)))
    }

    fn fill_credentials_from_env(&mut self) {
        if self.openai.api_key.is_none() {
            self.openai.api_key = env_secret("OPENAI_API_KEY");
        }
        if self.search.api_key.is_none() {
            self.search.api_key = env_secret("SERPER_API_KEY");
        }
    }

    /// Check that every credential the crew needs is present and non-empty.
    ///
    /// Must pass before any agent is constructed.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !has_value(&self.openai.api_key) {
            missing.push("OPENAI_API_KEY");
        }
        if self.search.enabled && !has_value(&self.search.api_key) {
            missing.push("SERPER_API_KEY");
        }

        if !missing.is_empty() {
            return Err(CrewError::config(format!(
                "API keys must be set in the environment: {}",
                missing.join(", ")
            )));
        }

        if self.agent.exit_keyword.trim().is_empty() {
            return Err(CrewError::config("exit_keyword must not be empty"));
        }

        Ok(())
    }

    /// Use one model for both agents
    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        self.models.advisor = model.clone();
        self.models.reporter = model;
    }

    /// Full chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.openai.base_url.trim_end_matches('/'))
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
