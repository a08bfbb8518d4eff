// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ingestion-shaped record. Every field is optional on the wire and defaults to "".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawRecord {
    pub title: String,
    pub url: String,
    pub source: String, // provider-reported outlet / domain
    pub published_at: String,
    pub language: String,
    pub provider: String, // origin tag, e.g. "marketaux", "rss:reuters"
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>>;
    fn name(&self) -> &str;
}
