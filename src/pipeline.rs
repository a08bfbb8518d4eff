// src/pipeline.rs
//! One forward pass: dedup → normalize → classify → group → curate →
//! synthesize → assemble.
//!
//! Dedup runs before translation so duplicates are never sent to the
//! translator. Every synthesis prompt is built from the curated bundle.
//! Every stage returns fresh values; nothing is shared back.

use metrics::{counter, gauge};
use serde::Serialize;

use crate::assemble::{assemble, BriefDocument};
use crate::classify::{classify_all, RuleTable};
use crate::config::BriefConfig;
use crate::dedup::dedup;
use crate::evidence::{curate, group_by_section, SectionGroup};
use crate::item::NewsItem;
use crate::synth::provider::LlmProvider;
use crate::synth::SynthesisGateway;
use crate::translate::{normalize_languages, Translator};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub input: usize,
    pub kept: usize,
    pub duplicates: usize,
    pub dropped: usize,
    pub translated: usize,
    pub failed_translation_batches: usize,
    pub evidence_items: usize,
    /// Item count per non-empty section, in priority order.
    pub per_section: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub brief: BriefDocument,
    pub stats: PipelineStats,
}

/// Run the whole pipeline over an already-ingested list.
pub async fn run_pipeline<P: LlmProvider>(
    items: &[NewsItem],
    cfg: &BriefConfig,
    table: &RuleTable,
    translator: &dyn Translator,
    gateway: &SynthesisGateway<P>,
    date: &str,
) -> PipelineReport {
    crate::metrics::ensure_metrics_described();
    counter!("brief_items_in_total").increment(items.len() as u64);

    let deduped = dedup(items);
    counter!("brief_dedup_total").increment(deduped.duplicates as u64);
    counter!("brief_dropped_total").increment(deduped.dropped as u64);

    let normalized = normalize_languages(
        &deduped.items,
        &cfg.target_language,
        cfg.translate_batch_max,
        translator,
    )
    .await;

    let classified = classify_all(&normalized.items, table);
    let groups = group_by_section(&classified, table);
    let bundle = curate(&groups, &cfg.caps);

    let mut stats = PipelineStats {
        input: items.len(),
        kept: deduped.items.len(),
        duplicates: deduped.duplicates,
        dropped: deduped.dropped,
        translated: normalized.translated,
        failed_translation_batches: normalized.failed_batches,
        evidence_items: bundle.item_count(),
        per_section: Vec::new(),
    };

    if bundle.is_empty() {
        tracing::info!(target: "pipeline", input = stats.input, "no items survived; emitting placeholder");
        return PipelineReport {
            brief: assemble(date, "", &groups, ""),
            stats,
        };
    }

    let digest = gateway.digest(&bundle).await;

    // Section paragraphs are written only for sections in the curated bundle,
    // from the bundle's items; the rest of the brief lists items without one.
    let mut synthesized: Vec<SectionGroup> = Vec::with_capacity(groups.len());
    for g in &groups {
        if g.is_empty() {
            synthesized.push(g.clone());
            continue;
        }
        stats
            .per_section
            .push((g.section.name().to_string(), g.items.len()));
        match bundle.sections.iter().find(|(s, _)| s == &g.section) {
            Some((section, evidence)) => {
                let paragraph = gateway.section_summary(section, evidence).await;
                synthesized.push(g.with_synthesis(&paragraph));
            }
            None => synthesized.push(g.clone()),
        }
    }

    let implications = gateway.implications(&bundle).await;
    let brief = assemble(date, &digest, &synthesized, &implications);

    let now = chrono::Utc::now().timestamp().max(0) as f64;
    gauge!("brief_pipeline_last_run_ts").set(now);
    tracing::info!(
        target: "pipeline",
        input = stats.input,
        kept = stats.kept,
        duplicates = stats.duplicates,
        translated = stats.translated,
        sections = stats.per_section.len(),
        evidence_items = stats.evidence_items,
        provider = gateway.provider_name(),
        "brief assembled"
    );

    PipelineReport { brief, stats }
}
