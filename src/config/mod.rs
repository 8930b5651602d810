mod file_config;

pub use file_config::{EnrichmentConfig, FileConfig, ListingConfig, SearchConfig};

use crate::enrichment_store::DEFAULT_COLLECTION;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_DB_FILE: &str = "imdb.db";
pub const DEFAULT_ENRICHMENT_DB_FILE: &str = "enrichment.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub catalog_db: Option<PathBuf>,
    pub enrichment_db: Option<PathBuf>,
    pub disable_enrichment: bool,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub catalog_db: Option<PathBuf>,
    pub enrichment_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: usize,
    pub catalog_timeout: Duration,
    pub enrichment_timeout: Duration,

    // Feature configs (with defaults)
    pub listing: ListingSettings,
    pub search: SearchSettings,
    pub enrichment: EnrichmentSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let catalog_db = file
            .catalog_db
            .map(PathBuf::from)
            .or_else(|| cli.catalog_db.clone());
        let enrichment_db = file
            .enrichment_db
            .map(PathBuf::from)
            .or_else(|| cli.enrichment_db.clone());

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let read_pool_size = file.read_pool_size.unwrap_or(cli.read_pool_size).max(1);
        let catalog_timeout = Duration::from_millis(file.catalog_timeout_ms.unwrap_or(5000));
        let enrichment_timeout = Duration::from_millis(file.enrichment_timeout_ms.unwrap_or(3000));

        let listing_file = file.listing.unwrap_or_default();
        let defaults = ListingSettings::default();
        let max_page_size = listing_file
            .max_page_size
            .unwrap_or(defaults.max_page_size)
            .max(1);
        let default_page_size = listing_file
            .default_page_size
            .unwrap_or(defaults.default_page_size)
            .clamp(1, max_page_size);
        let listing = ListingSettings {
            default_page_size,
            max_page_size,
            only_enriched_max_docs: listing_file.only_enriched_max_docs,
        };

        let search_file = file.search.unwrap_or_default();
        let search = SearchSettings {
            movies_limit: search_file
                .movies_limit
                .unwrap_or(SearchSettings::default().movies_limit),
            persons_limit: search_file
                .persons_limit
                .unwrap_or(SearchSettings::default().persons_limit),
        };

        let enrichment_file = file.enrichment.unwrap_or_default();
        let enrichment = EnrichmentSettings {
            enabled: enrichment_file.enabled.unwrap_or(!cli.disable_enrichment),
            collection: enrichment_file
                .collection
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        };

        Ok(Self {
            db_dir,
            catalog_db,
            enrichment_db,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            read_pool_size,
            catalog_timeout,
            enrichment_timeout,
            listing,
            search,
            enrichment,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.catalog_db
            .clone()
            .unwrap_or_else(|| self.db_dir.join(DEFAULT_CATALOG_DB_FILE))
    }

    pub fn enrichment_db_path(&self) -> PathBuf {
        self.enrichment_db
            .clone()
            .unwrap_or_else(|| self.db_dir.join(DEFAULT_ENRICHMENT_DB_FILE))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSettings {
    /// Page size used when the request does not give one.
    pub default_page_size: usize,
    /// Larger requested page sizes are clamped to this.
    pub max_page_size: usize,
    pub only_enriched_max_docs: Option<usize>,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            only_enriched_max_docs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub movies_limit: usize,
    pub persons_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            movies_limit: 20,
            persons_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    pub enabled: bool,
    pub collection: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
