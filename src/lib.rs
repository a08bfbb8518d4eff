// src/lib.rs
//! Daily brief pipeline: turns multi-provider news records into a
//! deduplicated, language-normalized, topic-classified brief.
//!
//! Stages run strictly forward over an in-memory list:
//! dedup → translate → classify → group/curate → synthesize → assemble.
//! Providers, the translator and the LLM are collaborators behind traits;
//! their failures degrade to empty results and never abort a run.

pub mod assemble;
pub mod classify;
pub mod config;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod evidence;
pub mod ingest;
pub mod item;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod synth;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::assemble::BriefDocument;
pub use crate::classify::RuleTable;
pub use crate::config::BriefConfig;
pub use crate::error::BriefError;
pub use crate::item::{NewsItem, Section};
pub use crate::pipeline::{run_pipeline, PipelineReport};
