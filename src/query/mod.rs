mod error;
mod models;
mod params;
mod service;

pub use error::QueryError;
pub use models::{
    DegradedReason, Enrichment, HomeSelections, MovieDetail, StatsOverview, StorageOverview,
};
pub use params::{ListParams, NormalizedListing};
pub use service::{QuerySettings, QueryService};
