//! Client configuration (layered: code > env > config file).

use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:2024";
const DEFAULT_ASSISTANT_ID: &str = "agent";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the remote agent execution service.
///
/// Resolution order:
/// 1. Values set in code (builder or direct field assignment)
/// 2. Environment variables (`.env` is loaded if present)
/// 3. A TOML config file
///
/// Per-call settings such as the selected model or the connected chain are
/// not part of this struct; they travel with each run in
/// [`RunContext`](crate::run_source::RunContext).
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[builder(into)]
    #[serde(default)]
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_ASSISTANT_ID.to_string())]
    #[serde(default = "default_assistant_id")]
    pub assistant_id: String,
    /// Prefix for share links when the service only returns a token.
    #[builder(into)]
    #[serde(default)]
    pub share_base_url: Option<String>,
    /// Longest silence tolerated on an open run stream, and the total
    /// deadline of one-shot requests such as share links. A run may stream
    /// for longer than this as long as events keep arriving.
    #[builder(default = DEFAULT_TIMEOUT_SECS)]
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[builder(default = DEFAULT_CONNECT_TIMEOUT_SECS)]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_assistant_id() -> String {
    DEFAULT_ASSISTANT_ID.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().with_env_overrides()
    }

    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read a TOML config file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Overlay any `CRYPTOCHAT_*` environment variables onto this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("CRYPTOCHAT_API_URL") {
            self.base_url = url;
        }
        if let Ok(key) = std::env::var("CRYPTOCHAT_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("CRYPTOCHAT_ASSISTANT_ID") {
            self.assistant_id = id;
        }
        if let Ok(url) = std::env::var("CRYPTOCHAT_SHARE_URL") {
            self.share_base_url = Some(url);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ChatError::Configuration("base_url is empty".into()));
        }
        if self.assistant_id.trim().is_empty() {
            return Err(ChatError::Configuration("assistant_id is empty".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builder_fills_defaults() {
        let config = ClientConfig::builder().api_key("k").build();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.assistant_id, DEFAULT_ASSISTANT_ID);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn toml_missing_keys_use_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://agents.example.com/"
            share_base_url = "https://share.example.com/r"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_root(), "https://agents.example.com");
        assert_eq!(config.assistant_id, DEFAULT_ASSISTANT_ID);
        assert_eq!(
            config.share_base_url.as_deref(),
            Some("https://share.example.com/r")
        );
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = ClientConfig::from_toml_str("base_url = [").unwrap_err();
        assert!(matches!(err, ChatError::Toml(_)));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "assistant_id = \"\"").unwrap();
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }
}
