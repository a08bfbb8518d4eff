// src/config/mod.rs
//! Run configuration: one immutable `BriefConfig` built at startup and passed
//! by reference into every stage.

pub mod ai;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BriefError, Result};
pub use ai::AiConfig;

pub const ENV_CONFIG_PATH: &str = "DAILY_BRIEF_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/daily_brief.toml";

/// Size caps for everything fed to the synthesis collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Caps {
    /// K: max sections in the evidence bundle.
    pub max_sections: usize,
    /// M: max items per section in the evidence bundle.
    pub max_items_per_section: usize,
    /// Items sent to a per-section synthesis call.
    pub section_items_max: usize,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            max_sections: 6,
            max_items_per_section: 5,
            section_items_max: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketauxConfig {
    pub enabled: bool,
    pub base_url: String,
    pub per_call_limit: u32,
    pub target: usize,
    pub request_delay_ms: u64,
    pub filter_entities: bool,
    pub language: Option<String>,
    pub countries: Option<String>,
}

impl Default for MarketauxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.marketaux.com/v1/news/all".to_string(),
            per_call_limit: 3,
            target: 24,
            request_delay_ms: 600,
            filter_entities: true,
            language: None,
            countries: None,
        }
    }
}

/// An RSS feed to ingest alongside the news API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefConfig {
    /// ISO 639-1 code every display title is normalized to.
    pub target_language: String,
    pub caps: Caps,
    /// Max titles per translation request; larger sets are split.
    pub translate_batch_max: usize,
    /// Optional TOML rule table; the built-in table is used when absent.
    pub rules_path: Option<PathBuf>,
    pub ai: AiConfig,
    pub marketaux: MarketauxConfig,
    pub feeds: Vec<FeedConfig>,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            target_language: "en".to_string(),
            caps: Caps::default(),
            translate_batch_max: 40,
            rules_path: None,
            ai: AiConfig::default(),
            marketaux: MarketauxConfig::default(),
            feeds: Vec::new(),
        }
    }
}

impl BriefConfig {
    /// Parse TOML and sanitize out-of-range values back to their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: BriefConfig =
            toml::from_str(s).map_err(|e| BriefError::Config(format!("invalid config: {e}")))?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        let defaults = Caps::default();
        if self.caps.max_sections == 0 {
            self.caps.max_sections = defaults.max_sections;
        }
        if self.caps.max_items_per_section == 0 {
            self.caps.max_items_per_section = defaults.max_items_per_section;
        }
        if self.caps.section_items_max == 0 {
            self.caps.section_items_max = defaults.section_items_max;
        }
        if self.translate_batch_max == 0 {
            self.translate_batch_max = 40;
        }
        self.target_language = self.target_language.trim().to_ascii_lowercase();
        if self.target_language.is_empty() {
            self.target_language = "en".to_string();
        }
        if self.marketaux.per_call_limit == 0 {
            self.marketaux.per_call_limit = 3;
        }
        self.ai.sanitize();
    }
}

/// Load configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<BriefConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| BriefError::Config(format!("reading config {}: {e}", path.display())))?;
    BriefConfig::from_toml_str(&content)
}

/// Load configuration using env var + fallbacks:
/// 1) $DAILY_BRIEF_CONFIG
/// 2) config/daily_brief.toml
/// 3) built-in defaults
pub fn load_config_default() -> Result<BriefConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(BriefError::Config(format!(
            "{ENV_CONFIG_PATH} points to non-existent path {}",
            pb.display()
        )));
    }
    let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_p.exists() {
        return load_config_from(&default_p);
    }
    Ok(BriefConfig::default())
}
