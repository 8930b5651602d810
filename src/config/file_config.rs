use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub catalog_db: Option<String>,
    pub enrichment_db: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: Option<usize>,
    pub catalog_timeout_ms: Option<u64>,
    pub enrichment_timeout_ms: Option<u64>,

    // Feature configs
    pub listing: Option<ListingConfig>,
    pub search: Option<SearchConfig>,
    pub enrichment: Option<EnrichmentConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ListingConfig {
    pub default_page_size: Option<usize>,
    pub max_page_size: Option<usize>,
    /// Restrict listings to enriched movies when the enrichment collection
    /// holds at most this many documents.
    pub only_enriched_max_docs: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub movies_limit: Option<usize>,
    pub persons_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: Option<bool>,
    /// Name of the document collection holding per-movie aggregates.
    pub collection: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
