// src/output.rs
//! Files written at the end of a run: the markdown brief, the serialized
//! document, a CSV index of the fetched articles, and the raw ingestion dump.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::RawRecord;
use crate::pipeline::PipelineReport;

const CSV_HEADER: [&str; 4] = ["published_at", "source", "title", "url"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub markdown: PathBuf,
    pub document: PathBuf,
    pub csv: PathBuf,
    pub raw: PathBuf,
}

#[derive(Serialize)]
struct RawDump<'a> {
    count: usize,
    data: &'a [RawRecord],
}

/// One fetched article, in the order the spreadsheet columns appear.
#[derive(Serialize)]
struct CsvRow<'a> {
    published_at: &'a str,
    source: &'a str,
    title: &'a str,
    url: &'a str,
}

/// `published_at,source,title,url`, one row per fetched record, arrival order.
fn render_csv(raw: &[RawRecord]) -> Result<String> {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(CSV_HEADER).context("writing csv header")?;
    for r in raw {
        w.serialize(CsvRow {
            published_at: r.published_at.trim(),
            source: r.source.trim(),
            title: r.title.trim(),
            url: r.url.trim(),
        })
        .context("writing csv row")?;
    }
    let bytes = w.into_inner().context("flushing csv")?;
    String::from_utf8(bytes).context("csv is not utf-8")
}

/// Write via a temp file + rename so readers never see a half-written file.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
    Ok(())
}

pub fn write_outputs(
    report: &PipelineReport,
    raw: &[RawRecord],
    out_dir: &Path,
    raw_dir: &Path,
    target_language: &str,
) -> Result<OutputPaths> {
    let date = report.brief.date();
    let paths = OutputPaths {
        markdown: out_dir.join(format!("{date}.md")),
        document: out_dir.join(format!("{date}.json")),
        csv: out_dir.join(format!("{date}.csv")),
        raw: raw_dir.join(format!("{date}.json")),
    };

    let dump = RawDump {
        count: raw.len(),
        data: raw,
    };
    write_atomic(
        &paths.raw,
        &serde_json::to_string_pretty(&dump).context("serializing raw records")?,
    )?;
    write_atomic(&paths.csv, &render_csv(raw)?)?;
    write_atomic(&paths.markdown, &report.brief.to_markdown(target_language))?;
    write_atomic(
        &paths.document,
        &serde_json::to_string_pretty(report).context("serializing brief")?,
    )?;

    Ok(paths)
}
