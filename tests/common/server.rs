//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own catalog and enrichment database.

use super::constants::*;
use super::fixtures::{create_test_catalog, create_test_enrichment_db};
use cineexplorer_server::catalog_store::SqliteCatalogStore;
use cineexplorer_server::enrichment_store::{
    EnrichmentStore, NullEnrichmentStore, SqliteEnrichmentStore, DEFAULT_COLLECTION,
};
use cineexplorer_server::query::{QueryService, QuerySettings};
use cineexplorer_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// How the enrichment side of a test server is set up
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnrichmentSetup {
    /// A readable enrichment database with two documents
    Reachable,
    /// The enrichment database path points to a file that does not exist
    MissingDatabase,
    /// Enrichment disabled altogether
    Disabled,
}

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_catalog_dir: TempDir,
    _temp_enrichment_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server backed by a reachable enrichment store
    pub async fn spawn() -> Self {
        Self::spawn_with(EnrichmentSetup::Reachable, QuerySettings::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if fixture creation or port binding fails, or if the server
    /// doesn't become ready within timeout.
    pub async fn spawn_with(setup: EnrichmentSetup, settings: QuerySettings) -> Self {
        let (temp_catalog_dir, catalog_db_path) =
            create_test_catalog().expect("Failed to create test catalog");
        let (temp_enrichment_dir, enrichment_db_path) =
            create_test_enrichment_db().expect("Failed to create test enrichment db");

        let catalog_store = Arc::new(
            SqliteCatalogStore::new(&catalog_db_path, 2, Duration::from_millis(500))
                .expect("Failed to open catalog store"),
        );

        let enrichment_store: Arc<dyn EnrichmentStore> = match setup {
            EnrichmentSetup::Reachable => Arc::new(SqliteEnrichmentStore::new(
                &enrichment_db_path,
                DEFAULT_COLLECTION,
                Duration::from_millis(500),
            )),
            EnrichmentSetup::MissingDatabase => Arc::new(SqliteEnrichmentStore::new(
                temp_enrichment_dir.path().join("missing.db"),
                DEFAULT_COLLECTION,
                Duration::from_millis(500),
            )),
            EnrichmentSetup::Disabled => Arc::new(NullEnrichmentStore),
        };

        let query_service = Arc::new(QueryService::new(catalog_store, enrichment_store, settings));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            frontend_dir_path: None,
        };

        let app = make_app(config, query_service).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_catalog_dir: temp_catalog_dir,
            _temp_enrichment_dir: temp_enrichment_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the info endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
