mod error;
mod lookup;
mod models;
mod null_store;
mod schema;
mod store;
mod trait_def;

pub use error::EnrichmentError;
pub use lookup::get_enrichment_by_id;
pub use models::{CollectionCount, EnrichmentDocument, EnrichmentLookup};
pub use null_store::NullEnrichmentStore;
pub use schema::ENRICHMENT_VERSIONED_SCHEMAS;
pub use store::{SqliteEnrichmentStore, DEFAULT_COLLECTION};
#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockEnrichmentStore;
pub use trait_def::EnrichmentStore;
