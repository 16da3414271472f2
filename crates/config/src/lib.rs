//! Configuration loading, validation, and management for Doppel.
//!
//! Loads configuration from a TOML file (default `doppel.toml`) with
//! environment variable overrides for secrets. Validates settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `doppel.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Service name, reported by the health endpoint
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Language model settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Vector index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Email relay settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// The person this agent speaks for
    #[serde(default)]
    pub owner: OwnerConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Routing loop settings
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_service_name() -> String {
    "doppel".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("service_name", &self.service_name)
            .field("llm", &self.llm)
            .field("search", &self.search)
            .field("index", &self.index)
            .field("relay", &self.relay)
            .field("owner", &self.owner)
            .field("gateway", &self.gateway)
            .field("agent", &self.agent)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; `DOPPEL_LLM_API_KEY` or `OPENAI_API_KEY` override this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model used for decision steps
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for embeddings
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Model used to synthesize answers from retrieved context
    #[serde(default = "default_chat_model")]
    pub synthesis_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embed_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embed_model", &self.embed_model)
            .field("synthesis_model", &self.synthesis_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            chat_model: default_chat_model(),
            embed_model: default_embed_model(),
            synthesis_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key; `DOPPEL_SEARCH_API_KEY` overrides this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Results per query
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".into()
}
fn default_max_results() -> u32 {
    2
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_base_url(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Remote index URL; empty means the in-memory index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Namespace holding the owner's profile chunks
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Chunks retrieved per lookup
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_namespace() -> String {
    "profile".into()
}
fn default_top_k() -> usize {
    10
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("namespace", &self.namespace)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            namespace: default_namespace(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay service URL; empty disables email escalation delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bearer token; `DOPPEL_RELAY_TOKEN` overrides this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("url", &self.url)
            .field("token", &redact(&self.token))
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    #[serde(default = "default_owner_name")]
    pub name: String,

    /// Where escalation emails go
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// GitHub username injected into repository searches;
    /// `DOPPEL_GITHUB_USERNAME` overrides this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
}

fn default_owner_name() -> String {
    "Owner".into()
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            name: default_owner_name(),
            email: None,
            github_username: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowlist; empty means same-origin only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum decision rounds per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Timezone used when the time tool gets no argument
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// File holding the persona preamble (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble_file: Option<PathBuf>,

    /// Override the preamble entirely (skips file loading)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble_override: Option<String>,

    /// Tools whose arguments receive the owner's GitHub username
    #[serde(default = "default_needs_context")]
    pub needs_context: Vec<String>,
}

fn default_max_iterations() -> u32 {
    8
}
fn default_timezone() -> String {
    "Asia/Kolkata".into()
}
fn default_needs_context() -> Vec<String> {
    vec!["repo_search".into()]
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            default_timezone: default_timezone(),
            preamble_file: None,
            preamble_override: None,
            needs_context: default_needs_context(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `doppel.toml` in the working directory, or
    /// `DOPPEL_CONFIG` if set. Environment variables override secrets.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DOPPEL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("doppel.toml"));
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DOPPEL_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        } else if self.llm.api_key.is_none() {
            self.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        if let Ok(key) = std::env::var("DOPPEL_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("DOPPEL_RELAY_TOKEN") {
            self.relay.token = Some(token);
        }
        if let Ok(username) = std::env::var("DOPPEL_GITHUB_USERNAME") {
            self.owner.github_username = Some(username);
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.index.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "index.top_k must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            index: IndexConfig::default(),
            relay: RelayConfig::default(),
            owner: OwnerConfig::default(),
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.service_name, "doppel");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.agent.max_iterations, 8);
        assert_eq!(config.index.top_k, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.service_name, config.service_name);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agent.default_timezone, "Asia/Kolkata");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            llm: LlmConfig {
                temperature: 5.0,
                ..LlmConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            agent: AgentConfig {
                max_iterations: 0,
                ..AgentConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/doppel.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().service_name, "doppel");
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
service_name = "ghost"

[owner]
name = "Aayushmaan"
github_username = "aayushmaan"

[gateway]
port = 9001
allowed_origins = ["http://localhost:3000"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.service_name, "ghost");
        assert_eq!(config.owner.name, "Aayushmaan");
        assert_eq!(config.gateway.port, 9001);
        assert_eq!(config.agent.max_iterations, 8);
        assert_eq!(config.agent.needs_context, vec!["repo_search".to_string()]);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            llm: LlmConfig {
                api_key: Some("sk-secret".into()),
                ..LlmConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
