// src/evidence.rs
//! Section grouping and the evidence curator.
//!
//! The bundle is a capped excerpt of the grouped corpus (first K non-empty
//! sections in priority order, first M items of each in arrival order). It is
//! the only thing synthesis prompts are built from.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::classify::{classify, RuleTable};
use crate::config::Caps;
use crate::item::{NewsItem, Section};

/// Items sharing a section, in arrival order, plus an optional synthesized paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionGroup {
    pub section: Section,
    pub items: Vec<NewsItem>,
    pub synthesis: Option<String>,
}

impl SectionGroup {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            items: Vec::new(),
            synthesis: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy with the synthesized paragraph attached; blank text means none.
    pub fn with_synthesis(&self, text: &str) -> Self {
        let text = text.trim();
        Self {
            synthesis: (!text.is_empty()).then(|| text.to_string()),
            ..self.clone()
        }
    }
}

/// One group per table section in priority order, then `Other`. Empty groups
/// are kept. Items are classified here if an earlier stage did not.
pub fn group_by_section(items: &[NewsItem], table: &RuleTable) -> Vec<SectionGroup> {
    let mut groups: Vec<SectionGroup> = table.sections().into_iter().map(SectionGroup::new).collect();
    let index: HashMap<Section, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.section.clone(), i))
        .collect();
    let other = groups.len() - 1;

    for it in items {
        let section = it.section.clone().unwrap_or_else(|| classify(it, table));
        let slot = index.get(&section).copied().unwrap_or(other);
        let item = if it.section.as_ref() == Some(&groups[slot].section) {
            it.clone()
        } else {
            it.with_section(groups[slot].section.clone())
        };
        groups[slot].items.push(item);
    }
    groups
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub sections: Vec<(Section, Vec<NewsItem>)>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|(_, v)| v.len()).sum()
    }

    /// Distinct non-empty sources, lowercased.
    pub fn source_names(&self) -> BTreeSet<String> {
        self.sections
            .iter()
            .flat_map(|(_, v)| v.iter())
            .map(|it| it.source.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn distinct_sources(&self) -> usize {
        self.source_names().len()
    }

    /// Prompt text: `[Section]` headers, one bullet per item.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|(section, items)| format!("[{section}]\n{}", render_items(items)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// `- title (source: …; published: …)` lines.
pub fn render_items(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(|it| {
            format!(
                "- {} (source: {}; published: {})",
                it.display_title(),
                it.source,
                it.published_at
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max_sections` non-empty groups, first `max_items_per_section` items each.
pub fn curate(groups: &[SectionGroup], caps: &Caps) -> EvidenceBundle {
    let sections = groups
        .iter()
        .filter(|g| !g.is_empty())
        .take(caps.max_sections)
        .map(|g| {
            (
                g.section.clone(),
                g.items
                    .iter()
                    .take(caps.max_items_per_section)
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    EvidenceBundle { sections }
}
