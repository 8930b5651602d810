use crate::catalog_store::CatalogError;
use thiserror::Error;

/// Errors surfaced by the query service. Enrichment failures never appear here.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Data store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<CatalogError> for QueryError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => QueryError::NotFound(id),
            CatalogError::StoreUnavailable(e) => QueryError::StoreUnavailable(e.to_string()),
            CatalogError::Schema(reason) => QueryError::StoreUnavailable(reason),
        }
    }
}
