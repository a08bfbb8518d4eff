// tests/metrics_pipeline.rs
#![cfg(feature = "strict-metrics")]
use std::sync::Arc;

use daily_brief::config::BriefConfig;
use daily_brief::ingest::providers::RssProvider;
use daily_brief::ingest::types::NewsProvider;
use daily_brief::ingest::{collect, to_items};
use daily_brief::metrics::Metrics;
use daily_brief::synth::provider::MockProvider;
use daily_brief::synth::SynthesisGateway;
use daily_brief::translate::LlmTranslator;
use daily_brief::{run_pipeline, RuleTable};

#[tokio::test]
async fn metrics_exposed_after_a_run() {
    // Installs the global recorder; this binary has a single test.
    let metrics = Metrics::init().expect("recorder");

    let xml = std::fs::read_to_string("tests/fixtures/markets_rss.xml").expect("fixture");
    let providers: Vec<Box<dyn NewsProvider>> =
        vec![Box::new(RssProvider::from_fixture("Markets", &xml))];
    let items = to_items(&collect(&providers).await);

    let provider = Arc::new(MockProvider::fixed("- Markets were mixed."));
    let translator = LlmTranslator::new(provider.clone());
    let gateway = SynthesisGateway::new(provider, 4);
    let _ = run_pipeline(
        &items,
        &BriefConfig::default(),
        &RuleTable::builtin(),
        &translator,
        &gateway,
        "2025-10-14",
    )
    .await;

    let out = metrics.render();
    for needle in [
        "ingest_events_total",
        "ingest_parse_ms",
        "brief_items_in_total",
        "brief_dedup_total",
        "brief_synthesis_calls_total",
        "kind=\"digest\"",
        "brief_pipeline_last_run_ts",
    ] {
        assert!(out.contains(needle), "missing {needle} in:\n{out}");
    }
}
