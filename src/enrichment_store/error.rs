use thiserror::Error;

/// Errors raised by enrichment store implementations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnrichmentError {
    #[error("Enrichment store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed enrichment document {id}: {reason}")]
    Malformed { id: String, reason: String },
}
