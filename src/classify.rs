// src/classify.rs
//! Section classifier: a priority-ordered rule table of case-insensitive
//! patterns, compiled once and passed by reference.
//!
//! TOML format:
//! ```toml
//! [[sections]]
//! name = "Rates & Central Banks"
//! patterns = ["interest rates?", "\\bfed\\b"]
//! ```
//!
//! Sections are tried in declared order, patterns in declared order; the first
//! hit wins. No hit → `Other`. Plain phrases are valid patterns, so
//! `"interest rate"` is a substring test.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{BriefError, Result};
use crate::item::{NewsItem, Section};

/// Built-in table, highest priority first.
const BUILTIN_SECTIONS: &[(&str, &[&str])] = &[
    (
        "Rates & Central Banks",
        &[
            r"interest rates?",
            r"rate (cut|hike|decision)s?",
            r"central bank",
            r"federal reserve",
            r"\bfed\b",
            r"\becb\b",
            r"\bboj\b",
            r"bank of (england|japan|canada)",
            r"monetary policy",
            r"\bpowell\b",
            r"\blagarde\b",
            r"\b\d+\s?(bps|basis points)\b",
        ],
    ),
    (
        "Macro & Economy",
        &[
            r"\binflation\b",
            r"\bcpi\b",
            r"\bgdp\b",
            r"\brecession\b",
            r"jobs report",
            r"payrolls?",
            r"unemployment",
            r"consumer (spending|confidence|prices)",
            r"\bpmi\b",
            r"retail sales",
        ],
    ),
    (
        "Earnings & Guidance",
        &[
            r"\bearnings\b",
            r"quarterly (results|profit|revenue)",
            r"\bguidance\b",
            r"\boutlook\b",
            r"\brevenue\b",
            r"\bprofit (warning|falls?|rises?|jumps?)",
            r"\beps\b",
            r"beats? estimates",
            r"miss(es)? estimates",
        ],
    ),
    (
        "Markets",
        &[
            r"\bstocks?\b",
            r"wall street",
            r"s&p 500",
            r"\bnasdaq\b",
            r"\bdow\b",
            r"\bequities\b",
            r"\bshares\b",
            r"treasur(y|ies) yields?",
            r"bond (market|yields?)",
            r"\bipo\b",
        ],
    ),
    (
        "Energy & Commodities",
        &[
            r"\boil\b",
            r"\bcrude\b",
            r"\bbrent\b",
            r"\bopec\+?",
            r"natural gas",
            r"\bgold\b",
            r"\bcopper\b",
            r"\bcommodit(y|ies)\b",
            r"\blng\b",
        ],
    ),
    (
        "Tech & AI",
        &[
            r"artificial intelligence",
            r"\bai\b",
            r"\bchips?\b",
            r"semiconductors?",
            r"\bnvidia\b",
            r"\bopenai\b",
            r"\bcloud\b",
            r"\bsoftware\b",
        ],
    ),
    (
        "Geopolitics",
        &[
            r"\btariffs?\b",
            r"\bsanctions?\b",
            r"trade (war|deal|talks)",
            r"\bwar\b",
            r"\belection\b",
            r"\bnato\b",
            r"\bceasefire\b",
        ],
    ),
    (
        "Crypto",
        &[
            r"\bbitcoin\b",
            r"\bethereum\b",
            r"\bcrypto(currency|currencies)?\b",
            r"\bstablecoins?\b",
        ],
    ),
];

/// Uncompiled table, as written in TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuleTableSpec {
    pub sections: Vec<SectionSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledSection {
    section: Section,
    patterns: Vec<Regex>,
}

/// Compiled, immutable rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    sections: Vec<CompiledSection>,
}

impl RuleTable {
    pub fn compile(spec: &RuleTableSpec) -> Result<Self> {
        let mut sections = Vec::with_capacity(spec.sections.len());
        for s in &spec.sections {
            let name = s.name.trim();
            if name.is_empty() {
                return Err(BriefError::Config("rule table: section without name".into()));
            }
            if Section::new(name).is_other() {
                return Err(BriefError::Config(
                    "rule table: \"Other\" is reserved for unmatched items".into(),
                ));
            }
            if sections.iter().any(|c: &CompiledSection| c.section.name() == name) {
                return Err(BriefError::Config(format!(
                    "rule table: duplicate section {name:?}"
                )));
            }
            let patterns = s
                .patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            BriefError::Config(format!("rule table: section {name:?} pattern {p:?}: {e}"))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            sections.push(CompiledSection {
                section: Section::new(name),
                patterns,
            });
        }
        Ok(Self { sections })
    }

    pub fn builtin_spec() -> RuleTableSpec {
        RuleTableSpec {
            sections: BUILTIN_SECTIONS
                .iter()
                .map(|(name, pats)| SectionSpec {
                    name: name.to_string(),
                    patterns: pats.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        // The built-in patterns are covered by tests; compiling them cannot fail.
        Self::compile(&Self::builtin_spec()).unwrap_or(Self {
            sections: Vec::new(),
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let spec: RuleTableSpec =
            toml::from_str(s).map_err(|e| BriefError::Config(format!("rule table: {e}")))?;
        Self::compile(&spec)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BriefError::Config(format!("reading rule table {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Declared sections in priority order, followed by `Other`.
    pub fn sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .map(|c| c.section.clone())
            .chain(std::iter::once(Section::other()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// First matching section in priority order, else `Other`. Pure.
pub fn classify(item: &NewsItem, table: &RuleTable) -> Section {
    let text = item.display_title();
    table
        .sections
        .iter()
        .find(|s| s.patterns.iter().any(|re| re.is_match(text)))
        .map(|s| s.section.clone())
        .unwrap_or_else(Section::other)
}

/// Classified copies of `items`, same order.
pub fn classify_all(items: &[NewsItem], table: &RuleTable) -> Vec<NewsItem> {
    items
        .iter()
        .map(|it| it.with_section(classify(it, table)))
        .collect()
}
