// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{BriefError, Result};

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[ai]` table: the chat-completions endpoint used for translation and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "openai" (any OpenAI-compatible endpoint) | "mock"
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Resolve the key, reading `OPENAI_API_KEY` when configured as "ENV".
    pub fn resolve_api_key(&self) -> Result<String> {
        let key = if self.api_key.trim().eq_ignore_ascii_case("env") {
            env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            self.api_key.trim().to_string()
        };
        if key.is_empty() {
            return Err(BriefError::Config("missing OPENAI_API_KEY".into()));
        }
        Ok(key)
    }

    pub(crate) fn sanitize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_resolution() {
        let cfg = AiConfig::default();
        env::remove_var("OPENAI_API_KEY");
        assert!(matches!(cfg.resolve_api_key(), Err(BriefError::Config(_))));

        env::set_var("OPENAI_API_KEY", "sk-test");
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-test");
        env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    fn literal_key_is_used_verbatim() {
        let cfg = AiConfig {
            api_key: " sk-inline ".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().unwrap(), "sk-inline");
    }
}
