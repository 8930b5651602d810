use thiserror::Error;

/// Errors raised by catalog store implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Catalog schema mismatch: {0}")]
    Schema(String),
}
