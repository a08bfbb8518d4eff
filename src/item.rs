// src/item.rs
//! `NewsItem` and the section tag it carries through the pipeline.
//!
//! Items are never mutated in place once a stage has produced them; the
//! `with_*` builders return an enriched copy for the next stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::normalize_text;
use crate::ingest::types::RawRecord;

/// Name of the fallback section every unmatched item lands in.
pub const OTHER_SECTION: &str = "Other";

/// One topic tag from the rule table (or the `Other` fallback).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(String);

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn other() -> Self {
        Self(OTHER_SECTION.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_other(&self) -> bool {
        self.0 == OTHER_SECTION
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    /// Display title in the target language; empty until normalization.
    pub title_en: String,
    pub source: String,
    pub url: String,
    /// Provider timestamp as received (RFC 3339 where the provider supports it), or empty.
    pub published_at: String,
    /// ISO 639 code, or empty when unknown.
    pub language: String,
    pub provider: String,
    /// Assigned by the classifier; `None` before classification.
    pub section: Option<Section>,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            title_en: String::new(),
            source: source.into(),
            url: String::new(),
            published_at: String::new(),
            language: String::new(),
            provider: String::new(),
            section: None,
        }
    }

    /// Build an item from an ingestion record; missing fields stay empty.
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            title: normalize_text(&raw.title),
            title_en: String::new(),
            source: raw.source.trim().to_string(),
            url: raw.url.trim().to_string(),
            published_at: raw.published_at.trim().to_string(),
            language: raw.language.trim().to_ascii_lowercase(),
            provider: raw.provider.trim().to_string(),
            section: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_published_at(mut self, ts: impl Into<String>) -> Self {
        self.published_at = ts.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_title_en(&self, title_en: impl Into<String>) -> Self {
        Self {
            title_en: title_en.into(),
            ..self.clone()
        }
    }

    pub fn with_section(&self, section: Section) -> Self {
        Self {
            section: Some(section),
            ..self.clone()
        }
    }

    /// Title used for classification and display: `title_en`, else `title`.
    pub fn display_title(&self) -> &str {
        if self.title_en.trim().is_empty() {
            &self.title
        } else {
            &self.title_en
        }
    }
}
