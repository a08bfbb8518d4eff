// src/ingest/providers/rss.rs
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::error::{BriefError, Result};
use crate::ingest::types::{NewsProvider, RawRecord};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// RFC 2822 `pubDate` → RFC 3339 UTC; unparseable dates become "".
fn rfc2822_to_rfc3339(ts: &str) -> String {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| dt.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
        .unwrap_or_default()
}

enum Mode {
    // Owned copy so tests don't need 'static fixtures.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

/// RSS 2.0 feed provider. `source` is the outlet name reported on every record.
pub struct RssProvider {
    source: String,
    mode: Mode,
}

impl RssProvider {
    pub fn from_fixture(source: &str, content: &str) -> Self {
        Self {
            source: source.to_string(),
            mode: Mode::Fixture(content.to_string()),
        }
    }

    pub fn from_url(source: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            source: source.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawRecord>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| BriefError::Parse(format!("rss feed {}: {e}", self.source)))?;

        let language = rss
            .channel
            .language
            .as_deref()
            .map(|l| l.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let out = rss
            .channel
            .item
            .into_iter()
            .filter(|it| {
                it.title.as_deref().is_some_and(|t| !t.trim().is_empty()) || it.link.is_some()
            })
            .map(|it| RawRecord {
                title: it.title.unwrap_or_default(),
                url: it.link.unwrap_or_default(),
                source: self.source.clone(),
                published_at: it
                    .pub_date
                    .as_deref()
                    .map(rfc2822_to_rfc3339)
                    .unwrap_or_default(),
                language: language.clone(),
                provider: format!("rss:{}", self.source.to_ascii_lowercase()),
            })
            .collect::<Vec<_>>();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.source
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pub_date_is_converted_to_utc() {
        assert_eq!(
            rfc2822_to_rfc3339("Tue, 14 Oct 2025 13:30:00 +0200"),
            "2025-10-14T11:30:00Z"
        );
        assert_eq!(rfc2822_to_rfc3339("yesterday"), "");
    }

    #[tokio::test]
    async fn malformed_feed_is_a_parse_error() {
        let p = RssProvider::from_fixture("Broken", "<html><body>nope</body></html>");
        let err = p.fetch_latest().await.unwrap_err();
        assert!(matches!(err, BriefError::Parse(_)));
    }
}
