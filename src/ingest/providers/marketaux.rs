// src/ingest/providers/marketaux.rs
//! Paged news API provider (`/v1/news/all`).
//!
//! Pages are requested until `target` records are collected, a page comes back
//! empty, or a page adds nothing new. A failed later page ends paging with
//! the records already collected. Records are de-duplicated within the run
//! by `uuid`, then `url`, then `title`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::config::MarketauxConfig;
use crate::error::{BriefError, Result};
use crate::ingest::types::{NewsProvider, RawRecord};

pub const ENV_API_KEY: &str = "MARKETAUX_API_KEY";

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<Article>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Article {
    uuid: Option<String>,
    title: Option<String>,
    url: Option<String>,
    source: Option<String>,
    published_at: Option<String>,
    language: Option<String>,
}

impl Article {
    fn uid(&self) -> Option<String> {
        [&self.uuid, &self.url, &self.title]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn into_record(self) -> RawRecord {
        RawRecord {
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            provider: "marketaux".to_string(),
        }
    }
}

pub struct MarketauxProvider {
    api_key: String,
    cfg: MarketauxConfig,
    client: reqwest::Client,
}

impl MarketauxProvider {
    pub fn new(api_key: String, cfg: MarketauxConfig, client: reqwest::Client) -> Self {
        Self {
            api_key,
            cfg,
            client,
        }
    }

    /// Fails with `BriefError::Config` when `MARKETAUX_API_KEY` is not set.
    pub fn from_env(cfg: MarketauxConfig, client: reqwest::Client) -> Result<Self> {
        let api_key = std::env::var(ENV_API_KEY).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(BriefError::Config(format!("missing {ENV_API_KEY}")));
        }
        Ok(Self::new(api_key.trim().to_string(), cfg, client))
    }

    fn query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut q = vec![
            ("api_token", self.api_key.clone()),
            ("limit", self.cfg.per_call_limit.to_string()),
            ("page", page.to_string()),
        ];
        if self.cfg.filter_entities {
            q.push(("filter_entities", "true".to_string()));
        }
        if let Some(lang) = &self.cfg.language {
            q.push(("language", lang.clone()));
        }
        if let Some(countries) = &self.cfg.countries {
            q.push(("countries", countries.clone()));
        }
        q
    }

    async fn fetch_page(&self, page: u32) -> Result<Page> {
        let resp = self
            .client
            .get(&self.cfg.base_url)
            .query(&self.query(page))
            .send()
            .await?
            .error_for_status()?;
        resp.json::<Page>()
            .await
            .map_err(|e| BriefError::Parse(format!("marketaux page {page}: {e}")))
    }
}

/// Fold one page into `results`; returns how many new records were added.
fn absorb_page(
    page: Page,
    seen: &mut HashSet<String>,
    results: &mut Vec<RawRecord>,
    target: usize,
) -> usize {
    let mut added = 0usize;
    for article in page.data {
        if results.len() >= target {
            break;
        }
        let Some(uid) = article.uid() else { continue };
        if !seen.insert(uid) {
            continue;
        }
        results.push(article.into_record());
        added += 1;
    }
    added
}

/// Page through until `target` records, an empty page, or a page with
/// nothing new. A failure on the first page is an error; a failure on a
/// later page keeps what was already collected.
async fn paginate<F, Fut>(target: usize, delay: Duration, mut fetch: F) -> Result<Vec<RawRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let mut results = Vec::with_capacity(target);
    let mut seen = HashSet::new();
    let mut page_no = 1u32;

    while results.len() < target {
        let page = match fetch(page_no).await {
            Ok(page) => page,
            Err(e) if page_no == 1 => return Err(e),
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    provider = "marketaux",
                    page = page_no,
                    kept = results.len(),
                    error = %e,
                    "page fetch failed; keeping earlier pages"
                );
                break;
            }
        };
        if !page.warnings.is_empty() {
            tracing::warn!(target: "ingest", provider = "marketaux", warnings = %page.warnings.join("; "), "api warnings");
        }
        if page.data.is_empty() {
            break;
        }
        if absorb_page(page, &mut seen, &mut results, target) == 0 {
            break;
        }
        page_no += 1;
        if results.len() < target && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(results)
}

#[async_trait]
impl NewsProvider for MarketauxProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>> {
        let delay = Duration::from_millis(self.cfg.request_delay_ms);
        paginate(self.cfg.target, delay, |n| self.fetch_page(n)).await
    }

    fn name(&self) -> &str {
        "marketaux"
    }
}
