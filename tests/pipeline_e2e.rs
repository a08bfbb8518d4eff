// tests/pipeline_e2e.rs
use std::fs;
use std::sync::Arc;

use daily_brief::config::BriefConfig;
use daily_brief::ingest::providers::RssProvider;
use daily_brief::ingest::types::NewsProvider;
use daily_brief::ingest::{collect, to_items};
use daily_brief::output::write_outputs;
use daily_brief::synth::provider::{DisabledProvider, LlmRequest, MockProvider};
use daily_brief::synth::SynthesisGateway;
use daily_brief::translate::LlmTranslator;
use daily_brief::{run_pipeline, RuleTable};

const MARKETS_XML: &str = include_str!("fixtures/markets_rss.xml");

const GERMAN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Handelsblatt</title>
    <language>de</language>
    <item>
      <title>Ölpreis steigt deutlich</title>
      <link>https://hb.example.test/oel</link>
      <pubDate>Tue, 14 Oct 2025 08:00:00 +0200</pubDate>
    </item>
    <item>
      <title>Bitcoin fällt unter 60.000 Dollar</title>
      <link>https://hb.example.test/btc</link>
    </item>
  </channel>
</rss>"#;

async fn ingest() -> (Vec<daily_brief::ingest::types::RawRecord>, Vec<daily_brief::NewsItem>) {
    let providers: Vec<Box<dyn NewsProvider>> = vec![
        Box::new(RssProvider::from_fixture("Markets", MARKETS_XML)),
        Box::new(RssProvider::from_fixture("Handelsblatt", GERMAN_XML)),
    ];
    let raw = collect(&providers).await;
    let items = to_items(&raw);
    (raw, items)
}

/// Translates the two German headlines; answers synthesis by call purpose.
fn scripted(req: &LlmRequest) -> daily_brief::error::Result<String> {
    if req.role_context.contains("translate") {
        let entries: Vec<serde_json::Value> = serde_json::from_str(&req.evidence_text).unwrap();
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                let title = e["title"].as_str().unwrap_or_default();
                let en = if title.starts_with("Ölpreis") {
                    "Oil price rises sharply"
                } else {
                    "Bitcoin falls below 60,000 dollars"
                };
                serde_json::json!({"index": e["index"], "language": "de", "english_title": en})
            })
            .collect();
        return Ok(format!("```json\n{}\n```", serde_json::Value::Array(rows)));
    }
    if req.instructions.contains("why today's news matters") {
        return Ok("- Higher rates and oil squeeze margins (Markets, Handelsblatt)".into());
    }
    if req.instructions.contains("summarize") {
        return Ok("## Heading the model should not echo\nSection wrap-up.".into());
    }
    Ok("- Fed hikes and oil climbs (Markets, Handelsblatt)".into())
}

#[tokio::test]
async fn fixtures_to_markdown_with_scripted_ai() {
    let (raw, items) = ingest().await;
    assert_eq!(raw.len(), 7);

    let provider = Arc::new(MockProvider::new(scripted));
    let translator = LlmTranslator::new(provider.clone());
    let gateway = SynthesisGateway::new(provider, 4);
    let cfg = BriefConfig::default();
    let table = RuleTable::builtin();

    let report = run_pipeline(&items, &cfg, &table, &translator, &gateway, "2025-10-14").await;

    assert_eq!(report.stats.input, 7);
    assert_eq!(report.stats.duplicates, 1);
    assert_eq!(report.stats.kept, 6);
    assert_eq!(report.stats.translated, 2);
    assert_eq!(report.stats.failed_translation_batches, 0);

    let names: Vec<&str> = report
        .brief
        .sections()
        .iter()
        .map(|g| g.section.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "Rates & Central Banks",
            "Energy & Commodities",
            "Tech & AI",
            "Crypto",
            "Other"
        ]
    );
    let energy = &report.brief.sections()[1];
    assert_eq!(energy.items.len(), 2);
    assert_eq!(energy.synthesis.as_deref(), Some("Section wrap-up."));

    let md = report.brief.to_markdown(&cfg.target_language);
    assert!(md.starts_with("# Daily Brief — 2025-10-14\n"));
    assert!(md.contains("- Fed hikes and oil climbs (Markets, Handelsblatt)"));
    assert!(md.contains(
        "- Oil price rises sharply [translated from DE] — Handelsblatt, 2025-10-14T06:00:00Z"
    ));
    assert!(md.contains("- Fed raises interest rate by 25bps — Markets, 2025-10-14T13:30:00Z"));
    assert!(!md.contains("Heading the model should not echo"));
    assert!(!md.contains("Fed Raises Interest Rate by 25bps!"));

    let pos = |needle: &str| md.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
    assert!(pos("## Rates & Central Banks") < pos("## Energy & Commodities"));
    assert!(pos("## Crypto") < pos("## Other"));
    assert!(pos("## Other") < pos("## Why this matters"));
    assert!(md.trim_end().ends_with("(Markets, Handelsblatt)"));

    let tmp = tempfile::tempdir().unwrap();
    let paths = write_outputs(
        &report,
        &raw,
        &tmp.path().join("out"),
        &tmp.path().join("raw"),
        &cfg.target_language,
    )
    .unwrap();
    assert_eq!(fs::read_to_string(&paths.markdown).unwrap(), md);
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&paths.document).unwrap()).unwrap();
    assert_eq!(doc["brief"]["kind"], "brief");
    assert_eq!(doc["stats"]["kept"], 6);
}

#[tokio::test]
async fn disabled_ai_still_produces_item_lists() {
    let (_raw, items) = ingest().await;
    let provider = Arc::new(DisabledProvider);
    let translator = LlmTranslator::new(provider.clone());
    let gateway = SynthesisGateway::new(provider, 4);
    let cfg = BriefConfig::default();

    let report = run_pipeline(
        &items,
        &cfg,
        &RuleTable::builtin(),
        &translator,
        &gateway,
        "2025-10-14",
    )
    .await;

    assert!(!report.brief.is_empty());
    assert_eq!(report.stats.translated, 0);
    assert_eq!(report.stats.failed_translation_batches, 1);
    assert!(report.brief.sections().iter().all(|g| g.synthesis.is_none()));

    let md = report.brief.to_markdown(&cfg.target_language);
    assert!(!md.contains("## Why this matters"));
    // Untranslated titles are shown as-is, without a marker.
    assert!(md.contains("- Ölpreis steigt deutlich — Handelsblatt"));
    assert!(!md.contains("[translated from"));
}

#[tokio::test]
async fn nothing_ingested_writes_placeholder() {
    let gateway = SynthesisGateway::new(
        MockProvider::new(|_| panic!("no synthesis for an empty corpus")),
        4,
    );
    let translator = LlmTranslator::new(Arc::new(DisabledProvider));
    let report = run_pipeline(
        &[],
        &BriefConfig::default(),
        &RuleTable::builtin(),
        &translator,
        &gateway,
        "2025-10-15",
    )
    .await;

    let tmp = tempfile::tempdir().unwrap();
    let paths = write_outputs(
        &report,
        &[],
        &tmp.path().join("out"),
        &tmp.path().join("raw"),
        "en",
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(paths.markdown).unwrap(),
        "# Daily Brief\n\n_No headlines available today._\n"
    );
}
