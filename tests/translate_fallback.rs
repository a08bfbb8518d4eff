// tests/translate_fallback.rs
use std::sync::{Arc, Mutex};

use daily_brief::error::BriefError;
use daily_brief::synth::provider::{LlmRequest, MockProvider};
use daily_brief::translate::{normalize_languages, LlmTranslator};
use daily_brief::NewsItem;

fn foreign_corpus() -> Vec<NewsItem> {
    vec![
        NewsItem::new("Ölpreis steigt deutlich", "Handelsblatt").with_language("de"),
        NewsItem::new("Wall Street opens higher", "Reuters").with_language("en-US"),
        NewsItem::new("日銀、金利据え置き", "Nikkei").with_language("ja"),
    ]
}

#[tokio::test]
async fn fenced_answer_is_extracted_and_applied() {
    let seen: Arc<Mutex<Vec<LlmRequest>>> = Arc::default();
    let sink = seen.clone();
    let provider = MockProvider::new(move |req| {
        sink.lock().unwrap().push(req.clone());
        Ok("Sure! Here you go:\n```json\n[\
            {\"index\":0,\"language\":\"de\",\"english_title\":\"Oil price rises sharply\"},\
            {\"index\":2,\"language\":\"ja\",\"title_en\":\"BOJ holds rates\"}\
        ]\n```"
            .to_string())
    });
    let translator = LlmTranslator::new(provider);

    let out = normalize_languages(&foreign_corpus(), "en", 40, &translator).await;
    assert_eq!(out.translated, 2);
    assert_eq!(out.failed_batches, 0);
    assert_eq!(out.items[0].title_en, "Oil price rises sharply");
    assert_eq!(out.items[1].title_en, "Wall Street opens higher");
    assert_eq!(out.items[2].title_en, "BOJ holds rates");
    // Original titles are never overwritten.
    assert_eq!(out.items[0].title, "Ölpreis steigt deutlich");

    let reqs = seen.lock().unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].temperature, 0.0);
    assert!(reqs[0].instructions.contains("'en'"));
    assert!(reqs[0].evidence_text.contains("\"index\":0"));
    assert!(reqs[0].evidence_text.contains("\"index\":2"));
    assert!(
        !reqs[0].evidence_text.contains("Wall Street"),
        "items already in the target language are not sent"
    );
}

#[tokio::test]
async fn prose_answer_degrades_to_original_titles() {
    let translator = LlmTranslator::new(MockProvider::fixed(
        "I'm sorry, I can't translate these headlines right now.",
    ));
    let out = normalize_languages(&foreign_corpus(), "en", 40, &translator).await;
    assert_eq!(out.translated, 0);
    assert_eq!(out.failed_batches, 1);
    for (it, orig) in out.items.iter().zip(foreign_corpus()) {
        assert_eq!(it.title_en, orig.title);
        assert_eq!(it.language, orig.language);
    }
}

#[tokio::test]
async fn failed_batch_does_not_poison_the_next_one() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let provider = MockProvider::new(move |req| {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            return Err(BriefError::Transport("timeout".into()));
        }
        assert!(req.evidence_text.contains("\"index\":2"));
        Ok(r#"[{"index":2,"english_title":"BOJ holds rates"}]"#.to_string())
    });
    let translator = LlmTranslator::new(provider);

    let out = normalize_languages(&foreign_corpus(), "en", 1, &translator).await;
    assert_eq!(*calls.lock().unwrap(), 2);
    assert_eq!(out.failed_batches, 1);
    assert_eq!(out.translated, 1);
    assert_eq!(out.items[0].title_en, "Ölpreis steigt deutlich");
    assert_eq!(out.items[2].title_en, "BOJ holds rates");
}

#[tokio::test]
async fn first_answer_for_an_index_wins() {
    let translator = LlmTranslator::new(MockProvider::fixed(
        r#"[{"index":0,"english_title":"Oil price rises"},{"index":0,"english_title":"Oil jumps"}]"#,
    ));
    let out = normalize_languages(&foreign_corpus(), "en", 40, &translator).await;
    assert_eq!(out.items[0].title_en, "Oil price rises");
    assert_eq!(out.translated, 1);
}

#[tokio::test]
async fn one_malformed_row_keeps_the_usable_ones() {
    // Row for item 2 carries a stringified index and is skipped on its own.
    let translator = LlmTranslator::new(MockProvider::fixed(
        r#"[{"index":0,"english_title":"Oil price rises sharply"},{"index":"2","english_title":"BOJ holds rates"}]"#,
    ));
    let out = normalize_languages(&foreign_corpus(), "en", 40, &translator).await;
    assert_eq!(out.translated, 1);
    assert_eq!(out.failed_batches, 0);
    assert_eq!(out.items[0].title_en, "Oil price rises sharply");
    assert_eq!(out.items[2].title_en, "日銀、金利据え置き");
}
