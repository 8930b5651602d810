//! EnrichmentStore trait definition.

use super::error::EnrichmentError;
use super::models::{CollectionCount, EnrichmentDocument};

/// Trait for enrichment storage backends.
///
/// Implementations report failures as values; callers that must never fail
/// go through [`super::get_enrichment_by_id`].
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait EnrichmentStore: Send + Sync {
    /// Get the enrichment document for a movie.
    fn find_document(&self, movie_id: &str) -> Result<Option<EnrichmentDocument>, EnrichmentError>;

    /// Number of documents in each collection.
    fn collection_counts(&self) -> Result<Vec<CollectionCount>, EnrichmentError>;

    /// All document ids of the enrichment collection, or `None` when it is
    /// empty or holds more than `max_docs` documents.
    fn document_ids(&self, max_docs: usize) -> Result<Option<Vec<String>>, EnrichmentError>;
}
