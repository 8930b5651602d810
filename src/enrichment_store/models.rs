//! Data models for the enrichment document store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pre-aggregated supplementary data for one movie, keyed by movie id.
///
/// Fields are free-form: the document store is maintained independently of
/// the catalog and its shape is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentDocument {
    pub movie_id: String,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCount {
    pub collection: String,
    pub documents: usize,
}

/// Outcome of an enrichment lookup as seen by callers. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentLookup {
    Found(EnrichmentDocument),
    NotFound,
    /// The store could not be reached or returned unusable data.
    Unavailable(String),
}
