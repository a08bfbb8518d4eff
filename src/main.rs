//! Daily brief binary: ingest, run the pipeline once, write the brief, exit.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_brief::classify::RuleTable;
use daily_brief::config::{load_config_default, load_config_from, BriefConfig};
use daily_brief::ingest::providers::{MarketauxProvider, RssProvider};
use daily_brief::ingest::types::NewsProvider;
use daily_brief::metrics::Metrics;
use daily_brief::synth::provider::{build_provider, DisabledProvider, DynProvider};
use daily_brief::synth::SynthesisGateway;
use daily_brief::translate::LlmTranslator;

#[derive(Debug, Parser)]
#[command(name = "daily-brief", version, about = "Build today's news brief")]
struct Cli {
    /// TOML config (defaults to $DAILY_BRIEF_CONFIG, then config/daily_brief.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the markdown and JSON brief
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Directory for the raw ingestion dump
    #[arg(long, default_value = "data/raw")]
    raw_dir: PathBuf,

    /// Date label for the brief (defaults to today, local time)
    #[arg(long)]
    date: Option<String>,

    /// Ingest from local RSS files instead of the network (repeatable)
    #[arg(long = "fixture")]
    fixtures: Vec<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_brief=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Network providers, or fixture providers when `--fixture` is given.
/// A provider with missing credentials is skipped for the run.
fn build_providers(cli: &Cli, cfg: &BriefConfig, http: &reqwest::Client) -> Result<Vec<Box<dyn NewsProvider>>> {
    let mut providers: Vec<Box<dyn NewsProvider>> = Vec::new();

    if !cli.fixtures.is_empty() {
        for path in &cli.fixtures {
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("reading fixture {}", path.display()))?;
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("fixture");
            providers.push(Box::new(RssProvider::from_fixture(name, &xml)));
        }
        return Ok(providers);
    }

    if cfg.marketaux.enabled {
        match MarketauxProvider::from_env(cfg.marketaux.clone(), http.clone()) {
            Ok(p) => providers.push(Box::new(p)),
            Err(e) => warn!(target: "ingest", error = %e, "skipping marketaux provider"),
        }
    }
    for feed in &cfg.feeds {
        providers.push(Box::new(RssProvider::from_url(&feed.name, &feed.url, http.clone())));
    }
    Ok(providers)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "metrics disabled");
            None
        }
    };

    let cfg = match &cli.config {
        Some(p) => load_config_from(p),
        None => load_config_default(),
    }
    .context("loading configuration")?;

    let table = match &cfg.rules_path {
        Some(p) => RuleTable::load_from(p).context("loading rule table")?,
        None => RuleTable::builtin(),
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("daily-brief/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(30))
        .build()
        .context("building http client")?;

    let providers = build_providers(&cli, &cfg, &http)?;
    let raw = daily_brief::ingest::collect(&providers).await;
    let items = daily_brief::ingest::to_items(&raw);
    info!(providers = providers.len(), records = raw.len(), "ingest finished");

    let llm: DynProvider = match build_provider(&cfg.ai) {
        Ok(p) => p,
        Err(e) => {
            warn!(target: "synthesis", error = %e, "AI unavailable; running without translation or synthesis");
            Arc::new(DisabledProvider)
        }
    };
    let translator = LlmTranslator::new(llm.clone());
    let gateway = SynthesisGateway::new(llm, cfg.caps.section_items_max);

    let date = cli
        .date
        .clone()
        .unwrap_or_else(|| chrono::Local::now().date_naive().to_string());

    let report = daily_brief::run_pipeline(&items, &cfg, &table, &translator, &gateway, &date).await;

    let paths = daily_brief::output::write_outputs(
        &report,
        &raw,
        &cli.out_dir,
        &cli.raw_dir,
        &cfg.target_language,
    )?;
    info!(markdown = %paths.markdown.display(), raw = %paths.raw.display(), "brief written");

    if let Some(m) = metrics {
        let prom = cli.out_dir.join(format!("{date}.prom"));
        if let Err(e) = std::fs::write(&prom, m.render()) {
            warn!(path = %prom.display(), error = %e, "failed writing metrics snapshot");
        }
    }

    Ok(())
}
