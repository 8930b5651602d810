//! Failure-absorbing enrichment lookup.

use super::error::EnrichmentError;
use super::models::EnrichmentLookup;
use super::trait_def::EnrichmentStore;
use crate::server::metrics;
use std::time::Instant;
use tracing::{debug, warn};

/// Looks up the enrichment document of a movie. Never fails.
///
/// A missing document is expected for most of the catalog and only logged at
/// debug level. An unreachable store or an unreadable document is logged as a
/// warning and reported as [`EnrichmentLookup::Unavailable`].
pub fn get_enrichment_by_id(store: &dyn EnrichmentStore, movie_id: &str) -> EnrichmentLookup {
    let start = Instant::now();
    let result = store.find_document(movie_id);
    metrics::record_db_query("enrichment_find_document", start.elapsed());

    let lookup = match result {
        Ok(Some(doc)) => EnrichmentLookup::Found(doc),
        Ok(None) => {
            debug!("No enrichment document for {}", movie_id);
            EnrichmentLookup::NotFound
        }
        Err(EnrichmentError::Unavailable(reason)) => {
            warn!(
                "Enrichment store unreachable while looking up {}: {}",
                movie_id, reason
            );
            metrics::record_db_connection_error();
            EnrichmentLookup::Unavailable(reason)
        }
        Err(err @ EnrichmentError::Malformed { .. }) => {
            warn!("Ignoring enrichment document for {}: {}", movie_id, err);
            EnrichmentLookup::Unavailable(err.to_string())
        }
    };
    metrics::record_enrichment_lookup(lookup.outcome_label());
    lookup
}

impl EnrichmentLookup {
    pub(crate) fn outcome_label(&self) -> &'static str {
        match self {
            EnrichmentLookup::Found(_) => "found",
            EnrichmentLookup::NotFound => "not_found",
            EnrichmentLookup::Unavailable(_) => "unavailable",
        }
    }
}
