use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cineexplorer_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use cineexplorer_server::config;
use cineexplorer_server::enrichment_store::{
    EnrichmentStore, NullEnrichmentStore, SqliteEnrichmentStore,
};
use cineexplorer_server::query::{QueryService, QuerySettings};
use cineexplorer_server::server::{metrics, run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the database files (imdb.db, enrichment.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Path to the SQLite catalog database, defaults to imdb.db in db_dir.
    #[clap(long, value_parser = parse_path)]
    pub catalog_db: Option<PathBuf>,

    /// Path to the enrichment document database, defaults to enrichment.db in db_dir.
    #[clap(long, value_parser = parse_path)]
    pub enrichment_db: Option<PathBuf>,

    /// Serve catalog data only, without looking up enrichment documents.
    #[clap(long)]
    pub disable_enrichment: bool,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Number of read connections to the catalog database.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            catalog_db: args.catalog_db.clone(),
            enrichment_db: args.enrichment_db.clone(),
            disable_enrichment: args.disable_enrichment,
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            read_pool_size: args.read_pool_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  catalog_db: {:?}", app_config.catalog_db_path());
    info!("  port: {}", app_config.port);

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();

    info!(
        "Opening SQLite catalog database at {:?}...",
        app_config.catalog_db_path()
    );
    let catalog_store = Arc::new(
        SqliteCatalogStore::new(
            app_config.catalog_db_path(),
            app_config.read_pool_size,
            app_config.catalog_timeout,
        )
        .with_context(|| {
            format!(
                "Could not open catalog database {:?}",
                app_config.catalog_db_path()
            )
        })?,
    );

    let statistics = catalog_store.compute_statistics()?;
    metrics::init_catalog_metrics(
        statistics.total_movies,
        statistics.total_persons,
        statistics.rated_movies,
    );

    let enrichment_store: Arc<dyn EnrichmentStore> = if app_config.enrichment.enabled {
        info!(
            "Using enrichment collection {} from {:?}",
            app_config.enrichment.collection,
            app_config.enrichment_db_path()
        );
        Arc::new(SqliteEnrichmentStore::new(
            app_config.enrichment_db_path(),
            &app_config.enrichment.collection,
            app_config.enrichment_timeout,
        ))
    } else {
        info!("Enrichment disabled, serving catalog data only");
        Arc::new(NullEnrichmentStore)
    };

    let query_service = Arc::new(QueryService::new(
        catalog_store,
        enrichment_store,
        QuerySettings {
            listing: app_config.listing.clone(),
            search: app_config.search.clone(),
        },
    ));

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    tokio::select! {
        result = run_server(
            query_service,
            app_config.logging_level.clone(),
            app_config.port,
            app_config.metrics_port,
            app_config.frontend_dir_path.clone(),
        ) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
