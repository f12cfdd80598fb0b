//! Configuration management for the KT tutor service.
//!
//! The service reads an optional JSON file at `~/.kt-tutor/config.json`
//! (or the path in `KT_CONFIG`), then applies environment overrides.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `GEMINI_API_KEY` / `GOOGLE_API_KEY` → llm.api_key
//! - `KT_MODEL` → llm.model
//! - `KT_DOCUMENTS_DIR` → documents.dir
//! - `KT_BIND_ADDRESS` → network.bind
//! - `KT_PORT` → network.port
//! - `KT_LOG_LEVEL` → observability.log_level
//! - `KT_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".kt-tutor"),
        |dirs| dirs.home_dir().join(".kt-tutor"),
    )
}

/// Get the configuration file path.
///
/// `KT_CONFIG` takes precedence over the default location.
pub fn config_path() -> PathBuf {
    std::env::var("KT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

// ============================================================================
// Network Configuration
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bind address. Default is `127.0.0.1` (local only).
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    5000
}

// ============================================================================
// Documents Configuration
// ============================================================================

/// Where KT documents live and how they are split for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Directory scanned for `.pdf` / `.docx` files (non-recursive).
    #[serde(default = "default_documents_dir")]
    pub dir: PathBuf,

    /// Character budget per chunk.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_max_chunk_chars() -> usize {
    1000
}

// ============================================================================
// LLM Configuration
// ============================================================================

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound on generated tokens per reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: i64,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Retries after a failed call
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,

    /// Base backoff between retries in milliseconds (doubles per attempt)
    #[serde(default = "default_llm_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
            retry_backoff_ms: default_llm_backoff_ms(),
        }
    }
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> i64 {
    8192
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_llm_retries() -> u32 {
    1
}

fn default_llm_backoff_ms() -> u64 {
    500
}

// ============================================================================
// Tutor Configuration
// ============================================================================

/// Walkthrough behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Tokens that mark a reply as "understood, move on" (case-insensitive
    /// substring match).
    #[serde(default = "default_affirmative_tokens")]
    pub affirmative_tokens: Vec<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            affirmative_tokens: default_affirmative_tokens(),
        }
    }
}

fn default_affirmative_tokens() -> Vec<String> {
    vec!["yes".into(), "understood".into(), "next".into()]
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub network: NetworkConfig,

    /// Document directory and chunking
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Generative model
    #[serde(default)]
    pub llm: LlmConfig,

    /// Walkthrough behaviour
    #[serde(default)]
    pub tutor: TutorConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with `.env` and environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        // A missing .env is the normal case outside development.
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }

        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }

        if let Some(model) = lookup("KT_MODEL") {
            self.llm.model = model;
        }

        if let Some(dir) = lookup("KT_DOCUMENTS_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }

        if let Some(bind) = lookup("KT_BIND_ADDRESS") {
            self.network.bind = bind;
        }

        if let Some(port) = lookup("KT_PORT") {
            match port.parse() {
                Ok(p) => self.network.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid KT_PORT"),
            }
        }

        if let Some(level) = lookup("KT_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Some(format) = lookup("KT_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Get the bind address as `host:port`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.network.bind, self.network.port)
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.llm.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.port, 5000);
        assert_eq!(config.documents.dir, PathBuf::from("documents"));
        assert_eq!(config.documents.max_chunk_chars, 1000);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.max_retries, 1);
        assert_eq!(
            config.tutor.affirmative_tokens,
            vec!["yes", "understood", "next"]
        );
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "documents": { "dir": "/srv/kt" }, "observability": { "level": "debug" } }"#,
        )
        .unwrap();

        assert_eq!(config.documents.dir, PathBuf::from("/srv/kt"));
        assert_eq!(config.documents.max_chunk_chars, 1000);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
        assert_eq!(config.network.bind, "127.0.0.1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup(&[
            ("GEMINI_API_KEY", "gm-key"),
            ("KT_DOCUMENTS_DIR", "/data/docs"),
            ("KT_PORT", "8088"),
            ("KT_LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.llm.api_key.as_deref(), Some("gm-key"));
        assert_eq!(config.documents.dir, PathBuf::from("/data/docs"));
        assert_eq!(config.network.port, 8088);
        assert_eq!(config.observability.log_format, "json");
        assert_eq!(config.listen_address(), "127.0.0.1:8088");
    }

    #[test]
    fn test_google_key_fallback_and_bad_port() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup(&[("GOOGLE_API_KEY", "g-key"), ("KT_PORT", "nope")]));

        assert_eq!(config.llm.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.network.port, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "llm": {{ "model": "gemini-2.0-flash", "timeout_secs": 30 }} }}"#)
            .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.temperature, 0.7);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
