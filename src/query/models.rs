//! Results of the query service use cases.

use crate::catalog_store::{
    ActorCredits, CatalogStatistics, DecadeCount, GenreCount, MovieDetails, MovieSummary,
    RatingBucket, TableCount,
};
use crate::enrichment_store::{CollectionCount, EnrichmentDocument};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Why a movie detail was served without enrichment.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradedReason {
    /// The enrichment store has no document for the movie.
    Missing,
    /// The enrichment store could not be read.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Available(EnrichmentDocument),
    Degraded(DegradedReason),
}

impl Enrichment {
    pub fn document(&self) -> Option<&EnrichmentDocument> {
        match self {
            Enrichment::Available(doc) => Some(doc),
            Enrichment::Degraded(_) => None,
        }
    }
}

/// Catalog data of a movie merged with its optional enrichment document.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub movie: MovieDetails,
    pub enrichment: Enrichment,
}

#[derive(Serialize)]
struct MovieDetailView<'a> {
    #[serde(flatten)]
    movie: &'a MovieDetails,
    enrichment: Option<&'a Map<String, Value>>,
}

/// Serialized as the movie fields plus an `enrichment` object, `null` when
/// degraded. The degradation reason stays internal.
impl Serialize for MovieDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MovieDetailView {
            movie: &self.movie,
            enrichment: self.enrichment.document().map(|doc| &doc.fields),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSelections {
    pub top_movies: Vec<MovieSummary>,
    pub recent_movies: Vec<MovieSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsOverview {
    #[serde(flatten)]
    pub statistics: CatalogStatistics,
    pub genres: Vec<GenreCount>,
    pub decades: Vec<DecadeCount>,
    pub rating_histogram: Vec<RatingBucket>,
    pub top_actors: Vec<ActorCredits>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageOverview {
    pub catalog_tables: Vec<TableCount>,
    pub enrichment_collections: Vec<CollectionCount>,
    pub enrichment_available: bool,
}
