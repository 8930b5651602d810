//! Null enrichment store implementation.
//!
//! Used when no enrichment database is configured. Every lookup reports the
//! store as unavailable, so movie details degrade instead of failing.

use super::error::EnrichmentError;
use super::models::{CollectionCount, EnrichmentDocument};
use super::trait_def::EnrichmentStore;

pub struct NullEnrichmentStore;

impl EnrichmentStore for NullEnrichmentStore {
    fn find_document(&self, _movie_id: &str) -> Result<Option<EnrichmentDocument>, EnrichmentError> {
        Err(EnrichmentError::Unavailable(
            "no enrichment store configured".to_string(),
        ))
    }

    fn collection_counts(&self) -> Result<Vec<CollectionCount>, EnrichmentError> {
        Err(EnrichmentError::Unavailable(
            "no enrichment store configured".to_string(),
        ))
    }

    fn document_ids(&self, _max_docs: usize) -> Result<Option<Vec<String>>, EnrichmentError> {
        Err(EnrichmentError::Unavailable(
            "no enrichment store configured".to_string(),
        ))
    }
}
