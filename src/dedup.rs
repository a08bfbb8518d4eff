// src/dedup.rs
//! Identity & dedup: collapse near-duplicate headlines from different
//! providers into the first-seen item.

use std::collections::HashSet;

use crate::item::NewsItem;

/// Case-folded title with non-alphanumerics stripped and whitespace collapsed.
pub fn normalize_title_key(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;
    for ch in title.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Normalized title, else the raw URL; `None` when both are empty.
pub fn canonical_key(item: &NewsItem) -> Option<String> {
    let key = normalize_title_key(&item.title);
    if !key.is_empty() {
        return Some(key);
    }
    let url = item.url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    pub items: Vec<NewsItem>,
    /// Items removed because an earlier item shared their key.
    pub duplicates: usize,
    /// Items removed because they had neither title nor URL.
    pub dropped: usize,
}

/// Single pass, first occurrence wins, arrival order preserved.
pub fn dedup(items: &[NewsItem]) -> DedupOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut out = DedupOutcome {
        items: Vec::with_capacity(items.len()),
        ..Default::default()
    };

    for it in items {
        match canonical_key(it) {
            None => out.dropped += 1,
            Some(key) => {
                if seen.insert(key) {
                    out.items.push(it.clone());
                } else {
                    out.duplicates += 1;
                }
            }
        }
    }

    tracing::debug!(
        target: "pipeline",
        input = items.len(),
        kept = out.items.len(),
        duplicates = out.duplicates,
        dropped = out.dropped,
        "dedup done"
    );
    out
}
