// src/translate.rs
//! Language normalizer: every item leaves with a display title (`title_en`)
//! in the target language.
//!
//! Items already in the target language (or with no language tag) copy their
//! title. The rest are sent to the `Translator` collaborator in batches; any
//! item without a usable answer keeps its original title. Translation failures
//! are logged, counted and never escalated.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decode::{decode_entries, truncate_for_log, Decoded};
use crate::error::Result;
use crate::item::NewsItem;
use crate::synth::provider::{LlmProvider, LlmRequest};

/// One title sent for translation; `index` is the item's position in the run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TranslationEntry {
    pub index: usize,
    pub language: String,
    pub title: String,
}

/// One decoded answer from the translator.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TranslatedTitle {
    pub index: usize,
    #[serde(default)]
    pub language: String,
    #[serde(alias = "title_en", alias = "translation")]
    pub english_title: String,
}

/// Translation collaborator. Returns the raw response text; decoding is the
/// normalizer's job so malformed answers degrade per item.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, batch: &[TranslationEntry], target_language: &str) -> Result<String>;
}

/// Language tags that carry no information.
fn is_unknown_language(lang: &str) -> bool {
    matches!(lang, "" | "unknown" | "und" | "xx")
}

/// Compare primary subtags only, so `en-US` counts as `en`.
pub fn same_language(a: &str, b: &str) -> bool {
    let primary = |s: &str| {
        s.trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    primary(a) == primary(b)
}

pub fn needs_translation(item: &NewsItem, target_language: &str) -> bool {
    let lang = item.language.trim().to_ascii_lowercase();
    !is_unknown_language(&lang)
        && !same_language(&lang, target_language)
        && !item.title.trim().is_empty()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub items: Vec<NewsItem>,
    /// Items whose display title came from the translator.
    pub translated: usize,
    /// Batches dropped because of a transport error or an unparseable answer.
    pub failed_batches: usize,
}

/// Produce normalized copies of `items`, translating at most `batch_max`
/// titles per collaborator call.
pub async fn normalize_languages(
    items: &[NewsItem],
    target_language: &str,
    batch_max: usize,
    translator: &dyn Translator,
) -> NormalizeOutcome {
    let pending: Vec<TranslationEntry> = items
        .iter()
        .enumerate()
        .filter(|(_, it)| needs_translation(it, target_language))
        .map(|(index, it)| TranslationEntry {
            index,
            language: it.language.trim().to_ascii_lowercase(),
            title: it.title.clone(),
        })
        .collect();

    let mut answers: HashMap<usize, TranslatedTitle> = HashMap::new();
    let mut failed_batches = 0usize;

    for batch in pending.chunks(batch_max.max(1)) {
        match translate_batch(batch, target_language, translator).await {
            Some(rows) => {
                for row in rows {
                    answers.entry(row.index).or_insert(row);
                }
            }
            None => {
                failed_batches += 1;
                counter!("brief_translate_failures_total").increment(1);
            }
        }
    }

    let mut translated = 0usize;
    let out = items
        .iter()
        .enumerate()
        .map(|(index, it)| match answers.get(&index) {
            Some(ans) => {
                translated += 1;
                let mut next = it.with_title_en(ans.english_title.trim());
                if !ans.language.trim().is_empty() {
                    next.language = ans.language.trim().to_ascii_lowercase();
                }
                next
            }
            None => it.with_title_en(it.title.clone()),
        })
        .collect::<Vec<_>>();

    counter!("brief_translated_total").increment(translated as u64);
    tracing::info!(
        target: "translate",
        pending = pending.len(),
        translated,
        failed_batches,
        "language normalization done"
    );

    NormalizeOutcome {
        items: out,
        translated,
        failed_batches,
    }
}

/// One collaborator call; `None` means the whole batch keeps original titles.
/// Rows for indices outside the batch, or with blank titles, are discarded.
async fn translate_batch(
    batch: &[TranslationEntry],
    target_language: &str,
    translator: &dyn Translator,
) -> Option<Vec<TranslatedTitle>> {
    let raw = match translator.translate(batch, target_language).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(target: "translate", error = %e, batch = batch.len(), "translator call failed");
            return None;
        }
    };

    let rows = match decode_entries::<TranslatedTitle>(&raw) {
        Decoded::Strict(rows) => rows,
        Decoded::Extracted(rows) => {
            tracing::debug!(target: "translate", "translation array extracted from free text");
            rows
        }
        Decoded::Unparseable => {
            tracing::warn!(
                target: "translate",
                batch = batch.len(),
                preview = %truncate_for_log(&raw, 200),
                "unparseable translation response"
            );
            return None;
        }
    };

    Some(
        rows.into_iter()
            .filter(|r| batch.iter().any(|e| e.index == r.index))
            .filter(|r| !r.english_title.trim().is_empty())
            .collect(),
    )
}

/// Tokens requested for a batch: about 60 per title, within [120, 3000].
fn output_budget(titles: usize) -> u32 {
    u32::try_from(titles)
        .unwrap_or(u32::MAX)
        .saturating_mul(60)
        .clamp(120, 3000)
}

/// Translator backed by the chat-completions provider.
pub struct LlmTranslator<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmTranslator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: LlmProvider> Translator for LlmTranslator<P> {
    async fn translate(&self, batch: &[TranslationEntry], target_language: &str) -> Result<String> {
        let payload = serde_json::to_string(batch)
            .map_err(|e| crate::error::BriefError::Parse(e.to_string()))?;
        let req = LlmRequest {
            role_context: "You translate news headlines faithfully and concisely.".to_string(),
            instructions: format!(
                "Translate each headline into language '{target_language}'. \
                 Reply with ONLY a JSON array of objects with keys \
                 \"index\" (copied from input), \"language\" (ISO 639-1 code of the source headline) \
                 and \"english_title\" (the translation). No commentary."
            ),
            evidence_text: payload,
            max_output_tokens: output_budget(batch.len()),
            temperature: 0.0,
        };
        self.provider.complete(&req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BriefError;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String>,
        calls: Mutex<Vec<Vec<TranslationEntry>>>,
    }

    impl Canned {
        fn ok(s: &str) -> Self {
            Self {
                reply: Ok(s.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Translator for Canned {
        async fn translate(&self, batch: &[TranslationEntry], _t: &str) -> Result<String> {
            self.calls.lock().unwrap().push(batch.to_vec());
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(BriefError::Transport(e.to_string())),
            }
        }
    }

    fn corpus() -> Vec<NewsItem> {
        vec![
            NewsItem::new("Stocks rise", "a").with_language("en"),
            NewsItem::new("Les marchés chutent", "b").with_language("fr"),
            NewsItem::new("Ohne Sprache", "c"),
            NewsItem::new("Die Zinsen steigen", "d").with_language("de"),
        ]
    }

    #[test]
    fn language_matching_uses_primary_subtag() {
        assert!(same_language("en-US", "en"));
        assert!(same_language("EN_gb", "en"));
        assert!(!same_language("fr", "en"));
        let it = NewsItem::new("x", "y").with_language("unknown");
        assert!(!needs_translation(&it, "en"));
    }

    #[tokio::test]
    async fn only_foreign_items_are_sent_in_one_batch() {
        let t = Canned::ok(r#"[{"index":1,"language":"fr","english_title":"Markets fall"}]"#);
        let out = normalize_languages(&corpus(), "en", 40, &t).await;

        let calls = t.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![1, 3]
        );

        assert_eq!(out.items[0].title_en, "Stocks rise");
        assert_eq!(out.items[1].title_en, "Markets fall");
        assert_eq!(out.items[2].title_en, "Ohne Sprache");
        // no mapping for index 3 -> original kept
        assert_eq!(out.items[3].title_en, "Die Zinsen steigen");
        assert_eq!(out.translated, 1);
        assert_eq!(out.failed_batches, 0);
    }

    #[tokio::test]
    async fn transport_failure_keeps_originals() {
        let t = Canned {
            reply: Err(BriefError::Transport("timeout".into())),
            calls: Mutex::new(Vec::new()),
        };
        let out = normalize_languages(&corpus(), "en", 40, &t).await;
        assert_eq!(out.failed_batches, 1);
        for (a, b) in out.items.iter().zip(corpus()) {
            assert_eq!(a.title_en, b.title);
        }
    }

    #[tokio::test]
    async fn out_of_batch_and_blank_rows_are_ignored() {
        let t = Canned::ok(
            r#"Here: [{"index":0,"english_title":"hijack"},{"index":3,"english_title":"  "},{"index":1,"english_title":"Markets fall","language":""}]"#,
        );
        let out = normalize_languages(&corpus(), "en", 40, &t).await;
        assert_eq!(out.items[0].title_en, "Stocks rise");
        assert_eq!(out.items[1].title_en, "Markets fall");
        assert_eq!(out.items[1].language, "fr");
        assert_eq!(out.items[3].title_en, "Die Zinsen steigen");
    }

    #[test]
    fn output_budget_is_clamped_without_overflow() {
        assert_eq!(output_budget(0), 120);
        assert_eq!(output_budget(10), 600);
        assert_eq!(output_budget(80_000_000), 3000);
        assert_eq!(output_budget(usize::MAX), 3000);
    }

    #[tokio::test]
    async fn batches_are_split() {
        let t = Canned::ok("[]");
        let _ = normalize_languages(&corpus(), "en", 1, &t).await;
        assert_eq!(t.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn nothing_to_translate_makes_no_call() {
        let t = Canned::ok("[]");
        let items = vec![NewsItem::new("Hello", "x").with_language("en")];
        let out = normalize_languages(&items, "en", 40, &t).await;
        assert!(t.calls.lock().unwrap().is_empty());
        assert_eq!(out.items[0].title_en, "Hello");
    }
}
