// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{NewsProvider, RawRecord};
use crate::item::NewsItem;
use metrics::counter;

/// Max chars kept from a headline after normalization.
const TITLE_MAX_CHARS: usize = 500;

/// Normalize headline text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (includes NBSP)
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }
    out
}

/// Fetch from every provider in order. A failing provider is logged and
/// contributes nothing; the rest still run.
pub async fn collect(providers: &[Box<dyn NewsProvider>]) -> Vec<RawRecord> {
    crate::metrics::ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                tracing::info!(target: "ingest", provider = p.name(), count = v.len(), "provider fetched");
                counter!("ingest_events_total").increment(v.len() as u64);
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
            }
        }
    }
    raw
}

/// Convert ingestion records to items, keeping arrival order.
pub fn to_items(raw: &[RawRecord]) -> Vec<NewsItem> {
    raw.iter().map(NewsItem::from_raw).collect()
}
