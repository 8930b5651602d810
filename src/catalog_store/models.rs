//! Catalog models read from the relational IMDB dataset.
//!
//! All models are plain data, serializable so the server can hand them
//! straight to the JSON layer.

use serde::{Deserialize, Serialize};

// =============================================================================
// Listing Input
// =============================================================================

/// Column a movie listing can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieOrderKey {
    Rating,
    Votes,
    Year,
    Title,
}

impl MovieOrderKey {
    pub fn parse_key(s: &str) -> Option<Self> {
        match s {
            "rating" => Some(MovieOrderKey::Rating),
            "votes" => Some(MovieOrderKey::Votes),
            "year" => Some(MovieOrderKey::Year),
            "title" => Some(MovieOrderKey::Title),
            _ => None,
        }
    }

    pub(crate) fn sql_expression(&self) -> &'static str {
        match self {
            MovieOrderKey::Rating => "r.average_rating",
            MovieOrderKey::Votes => "r.num_votes",
            MovieOrderKey::Year => "m.start_year",
            MovieOrderKey::Title => "m.primary_title COLLATE NOCASE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieOrder {
    pub key: MovieOrderKey,
    pub direction: SortDirection,
}

impl MovieOrder {
    pub fn new(key: MovieOrderKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Parses `rating`, `rating_desc`, `title_asc` and friends. A key given
    /// without a direction sorts descending.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (key, direction) = match s.rsplit_once('_') {
            Some((key, "asc")) => (key, Some(SortDirection::Asc)),
            Some((key, "desc")) => (key, Some(SortDirection::Desc)),
            _ => (s.as_str(), None),
        };
        let key = MovieOrderKey::parse_key(key)?;
        Some(Self {
            key,
            direction: direction.unwrap_or(SortDirection::Desc),
        })
    }
}

impl Default for MovieOrder {
    fn default() -> Self {
        Self::new(MovieOrderKey::Title, SortDirection::Asc)
    }
}

/// Conjunctive filters applied to a movie listing. `None` means unfiltered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieFilters {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub rating_min: Option<f64>,
    pub genre: Option<String>,
    pub title_type: Option<String>,
    /// Restricts the listing to these movie ids.
    pub only_ids: Option<Vec<String>>,
}

/// Already-normalized listing request. `page` starts at 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieListQuery {
    pub page: usize,
    pub page_size: usize,
    pub order: MovieOrder,
    pub filters: MovieFilters,
}

impl MovieListQuery {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

// =============================================================================
// Listing Output
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub movie_id: String,
    pub primary_title: String,
    pub original_title: Option<String>,
    pub title_type: String,
    pub start_year: Option<i32>,
    pub average_rating: Option<f64>,
    pub num_votes: Option<i64>,
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    pub items: Vec<MovieSummary>,
    /// Number of matching movies before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl MoviePage {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: vec![],
            total: 0,
            page,
            page_size,
        }
    }
}

// =============================================================================
// Movie Details
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub person_id: String,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

/// Director or writer credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub person_id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub person_id: String,
    pub name: String,
    /// `actor` or `actress`.
    pub category: String,
    pub ordering: i32,
    pub characters: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateTitle {
    pub region: Option<String>,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub movie_id: String,
    pub title_type: String,
    pub primary_title: String,
    pub original_title: Option<String>,
    pub is_adult: bool,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub average_rating: Option<f64>,
    pub num_votes: Option<i64>,
    pub genres: Vec<String>,
    pub directors: Vec<Credit>,
    pub writers: Vec<Credit>,
    pub cast: Vec<CastMember>,
    pub alternate_titles: Vec<AlternateTitle>,
}

// =============================================================================
// Search
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub movies: Vec<MovieSummary>,
    pub persons: Vec<PersonSummary>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.persons.is_empty()
    }
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total_movies: usize,
    pub total_persons: usize,
    pub rated_movies: usize,
    /// Mean of `average_rating` over rated movies, 0 when none are rated.
    pub average_rating: f64,
    pub average_votes: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: String,
    pub movies: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    /// First year of the decade, e.g. 1990.
    pub decade: i32,
    pub movies: usize,
}

/// Rated movies whose rating falls in `[bucket, bucket + 1)`. 10.0 lands in bucket 9.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub bucket: u8,
    pub movies: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorCredits {
    pub person_id: String,
    pub name: String,
    pub movies: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}
