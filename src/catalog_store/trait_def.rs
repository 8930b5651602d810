//! CatalogStore trait definition.
//!
//! Read-only access to the relational movie catalog. Implementations receive
//! already-normalized input; clamping and validation belong to the query layer.

use super::error::CatalogError;
use super::models::{
    ActorCredits, CatalogStatistics, DecadeCount, GenreCount, MovieDetails, MovieListQuery,
    MoviePage, RatingBucket, SearchResults, TableCount,
};

/// Trait for catalog storage backends.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Movies
    // =========================================================================

    /// One page of movies matching the filters, ordered by the requested key
    /// with NULLs last and ties broken by movie id.
    fn list_movies(&self, query: &MovieListQuery) -> Result<MoviePage, CatalogError>;

    /// A movie with its genres, credits, cast and alternate titles.
    fn get_movie(&self, movie_id: &str) -> Result<MovieDetails, CatalogError>;

    // =========================================================================
    // Search
    // =========================================================================

    /// Substring match over movie titles and person names. Case folding
    /// follows SQLite `LIKE` and only applies to ASCII letters, so "évadés"
    /// does not match "Évadés".
    fn search_entities(
        &self,
        query: &str,
        movies_limit: usize,
        persons_limit: usize,
    ) -> Result<SearchResults, CatalogError>;

    // =========================================================================
    // Aggregations
    // =========================================================================

    fn compute_statistics(&self) -> Result<CatalogStatistics, CatalogError>;

    /// Genres by number of movies, most common first.
    fn genre_counts(&self, limit: usize) -> Result<Vec<GenreCount>, CatalogError>;

    fn decade_counts(&self) -> Result<Vec<DecadeCount>, CatalogError>;

    fn rating_histogram(&self) -> Result<Vec<RatingBucket>, CatalogError>;

    /// Persons with the most distinct acting credits.
    fn top_actors(&self, limit: usize) -> Result<Vec<ActorCredits>, CatalogError>;

    /// Row count of every user table in the catalog file.
    fn table_counts(&self) -> Result<Vec<TableCount>, CatalogError>;
}
