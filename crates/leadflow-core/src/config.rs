use crate::error::{LeadflowError, Result};
use crate::generation::GenerationSettings;
use completion_client::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "leadflow.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// DatabaseConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl Config {
    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Overlay settings from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay settings from `lookup`. Blank values are ignored.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(base) = get("OPENAI_BASE_URL") {
            self.completion.base_url = base;
        }
        if let Some(model) = get("LEADFLOW_MODEL") {
            self.completion.model = model;
        }
        if let Some(port) = get("LEADFLOW_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                LeadflowError::InvalidConfig(format!("LEADFLOW_PORT is not a port number: {port}"))
            })?;
        }
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let completion = &self.completion;

        if completion.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            warnings.push(ConfigWarning::warning(
                "completion.api_key is not set (or OPENAI_API_KEY); generation requests will fail",
            ));
        }
        if !(0.0..=2.0).contains(&completion.temperature) {
            warnings.push(ConfigWarning::error(format!(
                "completion.temperature={} is outside 0..=2",
                completion.temperature
            )));
        }
        if completion.max_tokens == 0 {
            warnings.push(ConfigWarning::error("completion.max_tokens must be greater than 0"));
        }
        if completion.timeout_secs == 0 {
            warnings.push(ConfigWarning::error("completion.timeout_secs must be greater than 0"));
        }
        if !completion.base_url.starts_with("http://") && !completion.base_url.starts_with("https://") {
            warnings.push(ConfigWarning::error(format!(
                "completion.base_url '{}' is not an http(s) URL",
                completion.base_url
            )));
        }
        if self.database.url.is_none() {
            warnings.push(ConfigWarning::warning(
                "database.url is not set (or DATABASE_URL); only the in-memory store is available",
            ));
        }
        if self.database.max_connections == 0 {
            warnings.push(ConfigWarning::error("database.max_connections must be greater than 0"));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
