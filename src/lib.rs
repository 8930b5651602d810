//! CineExplorer Server Library
//!
//! Read-only access to an IMDB catalog and its enrichment documents, exposed
//! for the binaries and the end-to-end tests.

pub mod catalog_store;
pub mod config;
pub mod enrichment_store;
pub mod query;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use enrichment_store::{EnrichmentStore, NullEnrichmentStore, SqliteEnrichmentStore};
pub use query::{QueryService, QuerySettings};
pub use server::{run_server, RequestsLoggingLevel};
