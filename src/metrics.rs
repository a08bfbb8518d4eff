// src/metrics.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::error::{BriefError, Result};

/// One-time metrics registration (so series carry descriptions in the dump).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw records returned by providers.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("brief_items_in_total", "Items entering the pipeline.");
        describe_counter!("brief_dedup_total", "Items removed as duplicates.");
        describe_counter!(
            "brief_dropped_total",
            "Items removed for having neither title nor URL."
        );
        describe_counter!(
            "brief_translated_total",
            "Items whose display title came from the translator."
        );
        describe_counter!(
            "brief_translate_failures_total",
            "Translation batches that degraded to original titles."
        );
        describe_counter!("brief_synthesis_calls_total", "Synthesis calls by kind.");
        describe_counter!(
            "brief_synthesis_failures_total",
            "Synthesis calls that degraded to empty text."
        );
        describe_gauge!(
            "brief_pipeline_last_run_ts",
            "Unix ts when the pipeline last ran."
        );
    });
}

/// Prometheus recorder whose exposition text is written next to the brief.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| BriefError::Config(format!("prometheus: install recorder: {e}")))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Prometheus exposition format snapshot.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
