// src/assemble.rs
//! Brief assembler: digest → non-empty sections in priority order →
//! implications. A corpus with no items at all yields the explicit
//! `BriefDocument::Empty` placeholder.

use serde::Serialize;
use std::fmt::Write as _;

use crate::evidence::SectionGroup;
use crate::item::NewsItem;
use crate::translate::same_language;

pub const NO_HEADLINES: &str = "No headlines available today.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BriefDocument {
    /// Nothing survived the pipeline.
    Empty { date: String },
    Brief {
        date: String,
        digest: Option<String>,
        sections: Vec<SectionGroup>,
        implications: Option<String>,
    },
}

impl BriefDocument {
    pub fn is_empty(&self) -> bool {
        matches!(self, BriefDocument::Empty { .. })
    }

    pub fn date(&self) -> &str {
        match self {
            BriefDocument::Empty { date } | BriefDocument::Brief { date, .. } => date,
        }
    }

    pub fn sections(&self) -> &[SectionGroup] {
        match self {
            BriefDocument::Empty { .. } => &[],
            BriefDocument::Brief { sections, .. } => sections,
        }
    }

    /// Markdown rendering of the heading/ordering contract.
    pub fn to_markdown(&self, target_language: &str) -> String {
        let (date, digest, sections, implications) = match self {
            BriefDocument::Empty { .. } => return format!("# Daily Brief\n\n_{NO_HEADLINES}_\n"),
            BriefDocument::Brief {
                date,
                digest,
                sections,
                implications,
            } => (date, digest, sections, implications),
        };

        let mut md = String::new();
        let _ = writeln!(md, "# Daily Brief — {date}\n");
        if let Some(d) = digest {
            let _ = writeln!(md, "{d}\n");
        }
        for g in sections {
            let _ = writeln!(md, "## {}\n", g.section);
            if let Some(p) = &g.synthesis {
                let _ = writeln!(md, "{p}\n");
            }
            for it in &g.items {
                let _ = writeln!(md, "- {}", bullet(it, target_language));
            }
            md.push('\n');
        }
        if let Some(i) = implications {
            let _ = writeln!(md, "## Why this matters\n\n{i}\n");
        }
        md.truncate(md.trim_end().len());
        md.push('\n');
        md
    }
}

/// `[translated from XX]` when the resolved language differs from the target,
/// the title was actually translated, and no marker is already present.
pub fn language_marker(item: &NewsItem, target_language: &str) -> Option<String> {
    let lang = item.language.trim();
    let translated = !item.title_en.trim().is_empty() && item.title_en != item.title;
    if lang.is_empty() || same_language(lang, target_language) || !translated {
        return None;
    }
    if item.title_en.to_lowercase().contains("[translated") {
        return None;
    }
    Some(format!("[translated from {}]", lang.to_ascii_uppercase()))
}

/// `title [marker] — source, published`
pub fn bullet(item: &NewsItem, target_language: &str) -> String {
    let mut out = item.display_title().to_string();
    if let Some(m) = language_marker(item, target_language) {
        out.push(' ');
        out.push_str(&m);
    }
    let meta: Vec<&str> = [item.source.trim(), item.published_at.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !meta.is_empty() {
        out.push_str(" — ");
        out.push_str(&meta.join(", "));
    }
    out
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Compose the final document. `groups` must already be in priority order.
pub fn assemble(
    date: &str,
    digest: &str,
    groups: &[SectionGroup],
    implications: &str,
) -> BriefDocument {
    let sections: Vec<SectionGroup> = groups.iter().filter(|g| !g.is_empty()).cloned().collect();
    if sections.is_empty() {
        return BriefDocument::Empty {
            date: date.to_string(),
        };
    }
    BriefDocument::Brief {
        date: date.to_string(),
        digest: non_blank(digest),
        sections,
        implications: non_blank(implications),
    }
}
