// src/synth/mod.rs
//! Synthesis gateway: bounded, purpose-specific requests to the generative
//! collaborator.
//!
//! Every call is a single attempt. A transport failure, a disabled provider or
//! a blank answer all come back as `""`, which callers treat as "omit this
//! subsection".

pub mod provider;

use metrics::counter;
use std::collections::BTreeSet;

use crate::evidence::{render_items, EvidenceBundle};
use crate::item::{NewsItem, Section};
use provider::{LlmProvider, LlmRequest};

/// Temperature and length budget for one call kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisBudget {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Digest,
    Section,
    Implications,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Digest => "digest",
            CallKind::Section => "section",
            CallKind::Implications => "implications",
        }
    }

    pub fn budget(self) -> SynthesisBudget {
        match self {
            CallKind::Digest => SynthesisBudget {
                temperature: 0.3,
                max_output_tokens: 450,
            },
            CallKind::Section => SynthesisBudget {
                temperature: 0.2,
                max_output_tokens: 160,
            },
            CallKind::Implications => SynthesisBudget {
                temperature: 0.3,
                max_output_tokens: 300,
            },
        }
    }
}

const ROLE_CONTEXT: &str = "You are a financial news analyst writing a concise daily brief. \
Use only the headlines provided. Do not invent facts, numbers or sources.";

pub struct SynthesisGateway<P: LlmProvider> {
    provider: P,
    section_items_max: usize,
}

impl<P: LlmProvider> SynthesisGateway<P> {
    pub fn new(provider: P, section_items_max: usize) -> Self {
        Self {
            provider,
            section_items_max: section_items_max.max(1),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Top-level digest over the whole evidence bundle.
    pub async fn digest(&self, bundle: &EvidenceBundle) -> String {
        if bundle.is_empty() {
            return String::new();
        }
        let instructions = "Write a concise daily brief of about 180-220 words as bullet points. \
Merge stories that cover the same event. Start every line with \"- \". No headings.";
        self.call(CallKind::Digest, instructions.to_string(), bundle.render())
            .await
    }

    /// Two or three sentences on one section, using at most `section_items_max` items.
    pub async fn section_summary(&self, section: &Section, items: &[NewsItem]) -> String {
        let take = items.len().min(self.section_items_max);
        if take == 0 {
            return String::new();
        }
        let instructions = format!(
            "In 2-3 sentences, summarize what today's \"{section}\" headlines say taken together. \
Plain prose, no bullets, no heading."
        );
        self.call(CallKind::Section, instructions, render_items(&items[..take]))
            .await
    }

    /// Cross-section implications; each bullet must cite at least two distinct sources.
    pub async fn implications(&self, bundle: &EvidenceBundle) -> String {
        if bundle.distinct_sources() < 2 {
            return String::new();
        }
        let instructions = "Write 2-5 bullets on why today's news matters, connecting dots across \
sections. Every bullet MUST reference at least two distinct sources by name in parentheses, \
e.g. (Reuters, Bloomberg). Start every line with \"- \". No headings.";
        let text = self
            .call(CallKind::Implications, instructions.to_string(), bundle.render())
            .await;
        keep_cited_bullets(&text, &bundle.source_names())
    }

    async fn call(&self, kind: CallKind, instructions: String, evidence_text: String) -> String {
        let budget = kind.budget();
        let req = LlmRequest {
            role_context: ROLE_CONTEXT.to_string(),
            instructions,
            evidence_text,
            max_output_tokens: budget.max_output_tokens,
            temperature: budget.temperature,
        };

        counter!("brief_synthesis_calls_total", "kind" => kind.as_str()).increment(1);
        match self.provider.complete(&req).await {
            Ok(text) => {
                let cleaned = clean_synthesis(&text);
                if cleaned.is_empty() {
                    tracing::warn!(target: "synthesis", kind = kind.as_str(), "blank synthesis; omitting");
                }
                cleaned
            }
            Err(e) => {
                counter!("brief_synthesis_failures_total", "kind" => kind.as_str()).increment(1);
                tracing::warn!(
                    target: "synthesis",
                    kind = kind.as_str(),
                    provider = self.provider.name(),
                    error = %e,
                    "synthesis failed; omitting"
                );
                String::new()
            }
        }
    }
}

/// Strip code-fence lines and the run of headings the model echoes before
/// its answer, trim. Headings inside the answer are left alone.
pub fn clean_synthesis(text: &str) -> String {
    let mut leading = true;
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        let t = line.trim_start();
        if t.starts_with("```") {
            continue;
        }
        if leading {
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            leading = false;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Names a bullet may use for `source`: the name itself and, for a domain,
/// its first label (`www.reuters.com` → `reuters`).
fn source_aliases(source: &str) -> Vec<String> {
    let mut names = vec![source.to_string()];
    let host = source.strip_prefix("www.").unwrap_or(source);
    if let Some((stem, _)) = host.split_once('.') {
        if !stem.is_empty() && stem != source {
            names.push(stem.to_string());
        }
    }
    names
}

/// Keep only the lines that cite at least two distinct bundle sources.
fn keep_cited_bullets(text: &str, sources: &BTreeSet<String>) -> String {
    let aliases: Vec<Vec<String>> = sources.iter().map(|s| source_aliases(s)).collect();
    let mut dropped = 0usize;
    let kept: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter(|l| {
            let lower = l.to_lowercase();
            let cited = aliases
                .iter()
                .filter(|names| names.iter().any(|n| lower.contains(n.as_str())))
                .count();
            let ok = cited >= 2;
            if !ok {
                dropped += 1;
            }
            ok
        })
        .collect();
    if dropped > 0 {
        tracing::warn!(
            target: "synthesis",
            kept = kept.len(),
            dropped,
            "implication lines without two distinct sources removed"
        );
    }
    kept.join("\n")
}
