// src/ingest/providers/mod.rs
pub mod marketaux;
pub mod rss;

pub use marketaux::MarketauxProvider;
pub use rss::RssProvider;
