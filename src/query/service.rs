//! Use cases composed from the catalog and enrichment stores.

use super::error::QueryError;
use super::models::{
    DegradedReason, Enrichment, HomeSelections, MovieDetail, StatsOverview, StorageOverview,
};
use super::params::{ListParams, NormalizedListing};
use crate::catalog_store::{
    CatalogStore, GenreCount, MovieFilters, MovieListQuery, MovieOrder, MovieOrderKey, MoviePage,
    SearchResults, SortDirection,
};
use crate::config::{ListingSettings, SearchSettings};
use crate::enrichment_store::{get_enrichment_by_id, EnrichmentLookup, EnrichmentStore};
use std::sync::Arc;
use tracing::{debug, warn};

const GENRES_LIMIT: usize = 25;
const TOP_ACTORS_LIMIT: usize = 10;

const HOME_TOP_RATING_MIN: f64 = 7.5;
const HOME_TOP_COUNT: usize = 10;
const HOME_RECENT_YEAR_MIN: i32 = 2010;
const HOME_RECENT_COUNT: usize = 15;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySettings {
    pub listing: ListingSettings,
    pub search: SearchSettings,
}

pub struct QueryService {
    catalog: Arc<dyn CatalogStore>,
    enrichment: Arc<dyn EnrichmentStore>,
    settings: QuerySettings,
}

impl QueryService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        enrichment: Arc<dyn EnrichmentStore>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            catalog,
            enrichment,
            settings,
        }
    }

    /// Catalog data of a movie, overlaid with its enrichment document when the
    /// enrichment store has one and can be reached.
    ///
    /// Only catalog failures are errors. A missing movie is reported before
    /// the enrichment store is consulted.
    pub fn get_movie_detail(&self, movie_id: &str) -> Result<MovieDetail, QueryError> {
        let movie = self.catalog.get_movie(movie_id)?;

        let enrichment = match get_enrichment_by_id(self.enrichment.as_ref(), movie_id) {
            EnrichmentLookup::Found(doc) => Enrichment::Available(doc),
            EnrichmentLookup::NotFound => Enrichment::Degraded(DegradedReason::Missing),
            EnrichmentLookup::Unavailable(reason) => {
                Enrichment::Degraded(DegradedReason::Unavailable(reason))
            }
        };

        Ok(MovieDetail { movie, enrichment })
    }

    /// A page of movies. Out-of-range parameters are clamped, never rejected.
    pub fn list_movies_filtered(&self, params: &ListParams) -> Result<MoviePage, QueryError> {
        let mut query = match params.normalize(&self.settings.listing) {
            NormalizedListing::Query(query) => query,
            NormalizedListing::Empty { page, page_size } => {
                debug!("Listing filters cannot match, returning an empty page");
                return Ok(MoviePage::empty(page, page_size));
            }
        };

        if let Some(max_docs) = self.settings.listing.only_enriched_max_docs {
            query.filters.only_ids = self.enriched_movie_ids(max_docs);
        }

        Ok(self.catalog.list_movies(&query)?)
    }

    /// Ids of the enriched movies, when there are few enough of them to
    /// restrict listings to. Enrichment failures lift the restriction.
    fn enriched_movie_ids(&self, max_docs: usize) -> Option<Vec<String>> {
        match self.enrichment.document_ids(max_docs) {
            Ok(ids) => ids,
            Err(err) => {
                warn!("Listing without enrichment restriction: {}", err);
                None
            }
        }
    }

    pub fn search(&self, query: &str) -> Result<SearchResults, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(self.catalog.search_entities(
            query,
            self.settings.search.movies_limit,
            self.settings.search.persons_limit,
        )?)
    }

    pub fn stats(&self) -> Result<StatsOverview, QueryError> {
        Ok(StatsOverview {
            statistics: self.catalog.compute_statistics()?,
            genres: self.catalog.genre_counts(GENRES_LIMIT)?,
            decades: self.catalog.decade_counts()?,
            rating_histogram: self.catalog.rating_histogram()?,
            top_actors: self.catalog.top_actors(TOP_ACTORS_LIMIT)?,
        })
    }

    /// Best rated movies and most recent movies.
    pub fn home(&self) -> Result<HomeSelections, QueryError> {
        let top = self.catalog.list_movies(&MovieListQuery {
            page: 1,
            page_size: HOME_TOP_COUNT,
            order: MovieOrder::new(MovieOrderKey::Rating, SortDirection::Desc),
            filters: MovieFilters {
                rating_min: Some(HOME_TOP_RATING_MIN),
                ..Default::default()
            },
        })?;
        let recent = self.catalog.list_movies(&MovieListQuery {
            page: 1,
            page_size: HOME_RECENT_COUNT,
            order: MovieOrder::new(MovieOrderKey::Year, SortDirection::Desc),
            filters: MovieFilters {
                year_min: Some(HOME_RECENT_YEAR_MIN),
                ..Default::default()
            },
        })?;

        Ok(HomeSelections {
            top_movies: top.items,
            recent_movies: recent.items,
        })
    }

    pub fn genres(&self) -> Result<Vec<GenreCount>, QueryError> {
        Ok(self.catalog.genre_counts(GENRES_LIMIT)?)
    }

    /// Row counts of both stores. The enrichment part is left empty when that
    /// store cannot be read.
    pub fn storage_overview(&self) -> Result<StorageOverview, QueryError> {
        let catalog_tables = self.catalog.table_counts()?;
        let (enrichment_collections, enrichment_available) =
            match self.enrichment.collection_counts() {
                Ok(counts) => (counts, true),
                Err(err) => {
                    warn!("Enrichment collections unavailable: {}", err);
                    (vec![], false)
                }
            };

        Ok(StorageOverview {
            catalog_tables,
            enrichment_collections,
            enrichment_available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{
        ActorCredits, CatalogError, CatalogStatistics, DecadeCount, MovieDetails, MovieSummary,
        PersonSummary, RatingBucket, TableCount,
    };
    use crate::catalog_store::MockCatalogStore;
    use crate::enrichment_store::{
        CollectionCount, EnrichmentDocument, EnrichmentError, MockEnrichmentStore,
    };
    use mockall::predicate::eq;
    use std::sync::Mutex;

    const KNOWN_ID: &str = "tt0111161";
    const UNKNOWN_ID: &str = "tt9999999";

    fn summary(id: &str, title: &str) -> MovieSummary {
        MovieSummary {
            movie_id: id.to_string(),
            primary_title: title.to_string(),
            original_title: None,
            title_type: "movie".to_string(),
            start_year: Some(1994),
            average_rating: Some(9.3),
            num_votes: Some(2_800_000),
            genres: vec!["Drama".to_string()],
        }
    }

    fn details(id: &str) -> MovieDetails {
        MovieDetails {
            movie_id: id.to_string(),
            title_type: "movie".to_string(),
            primary_title: "The Shawshank Redemption".to_string(),
            original_title: None,
            is_adult: false,
            start_year: Some(1994),
            end_year: None,
            runtime_minutes: Some(142),
            average_rating: Some(9.3),
            num_votes: Some(2_800_000),
            genres: vec!["Drama".to_string()],
            directors: vec![],
            writers: vec![],
            cast: vec![],
            alternate_titles: vec![],
        }
    }

    /// Catalog with a single movie that records the listing queries it gets.
    #[derive(Default)]
    struct FakeCatalog {
        unavailable: bool,
        list_queries: Mutex<Vec<MovieListQuery>>,
    }

    impl FakeCatalog {
        fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), CatalogError> {
            if self.unavailable {
                return Err(CatalogError::StoreUnavailable(
                    rusqlite::Error::QueryReturnedNoRows,
                ));
            }
            Ok(())
        }
    }

    impl CatalogStore for FakeCatalog {
        fn list_movies(&self, query: &MovieListQuery) -> Result<MoviePage, CatalogError> {
            self.check()?;
            self.list_queries.lock().unwrap().push(query.clone());
            let items = vec![summary(KNOWN_ID, "The Shawshank Redemption")];
            Ok(MoviePage {
                total: items.len(),
                items,
                page: query.page,
                page_size: query.page_size,
            })
        }

        fn get_movie(&self, movie_id: &str) -> Result<MovieDetails, CatalogError> {
            self.check()?;
            if movie_id == KNOWN_ID {
                Ok(details(movie_id))
            } else {
                Err(CatalogError::NotFound(movie_id.to_string()))
            }
        }

        fn search_entities(
            &self,
            _query: &str,
            _movies_limit: usize,
            _persons_limit: usize,
        ) -> Result<SearchResults, CatalogError> {
            self.check()?;
            Ok(SearchResults {
                movies: vec![summary("tt0133093", "The Matrix")],
                persons: vec![PersonSummary {
                    person_id: "nm0000206".to_string(),
                    name: "Keanu Reeves".to_string(),
                    birth_year: Some(1964),
                    death_year: None,
                }],
            })
        }

        fn compute_statistics(&self) -> Result<CatalogStatistics, CatalogError> {
            self.check()?;
            Ok(CatalogStatistics {
                total_movies: 1,
                total_persons: 2,
                rated_movies: 1,
                average_rating: 9.3,
                average_votes: 2_800_000.0,
            })
        }

        fn genre_counts(&self, _limit: usize) -> Result<Vec<GenreCount>, CatalogError> {
            self.check()?;
            Ok(vec![GenreCount {
                genre: "Drama".to_string(),
                movies: 1,
            }])
        }

        fn decade_counts(&self) -> Result<Vec<DecadeCount>, CatalogError> {
            self.check()?;
            Ok(vec![DecadeCount {
                decade: 1990,
                movies: 1,
            }])
        }

        fn rating_histogram(&self) -> Result<Vec<RatingBucket>, CatalogError> {
            self.check()?;
            Ok((0..10)
                .map(|bucket| RatingBucket {
                    bucket,
                    movies: usize::from(bucket == 9),
                })
                .collect())
        }

        fn top_actors(&self, _limit: usize) -> Result<Vec<ActorCredits>, CatalogError> {
            self.check()?;
            Ok(vec![ActorCredits {
                person_id: "nm0000209".to_string(),
                name: "Tim Robbins".to_string(),
                movies: 1,
            }])
        }

        fn table_counts(&self) -> Result<Vec<TableCount>, CatalogError> {
            self.check()?;
            Ok(vec![TableCount {
                table: "movies".to_string(),
                rows: 1,
            }])
        }
    }

    /// Enrichment store answering every call the same way.
    struct FakeEnrichment {
        document: Result<Option<EnrichmentDocument>, EnrichmentError>,
        ids: Result<Option<Vec<String>>, EnrichmentError>,
    }

    impl FakeEnrichment {
        fn with_document() -> Self {
            let fields = match serde_json::json!({"tagline": "Fear can hold you prisoner"}) {
                serde_json::Value::Object(fields) => fields,
                _ => unreachable!(),
            };
            Self::new(Ok(Some(EnrichmentDocument {
                movie_id: KNOWN_ID.to_string(),
                fields,
            })))
        }

        fn empty() -> Self {
            Self::new(Ok(None))
        }

        fn unreachable() -> Self {
            let mut store = Self::new(Err(EnrichmentError::Unavailable(
                "connection refused".to_string(),
            )));
            store.ids = Err(EnrichmentError::Unavailable("connection refused".to_string()));
            store
        }

        fn new(document: Result<Option<EnrichmentDocument>, EnrichmentError>) -> Self {
            Self {
                document,
                ids: Ok(None),
            }
        }
    }

    impl EnrichmentStore for FakeEnrichment {
        fn find_document(
            &self,
            _movie_id: &str,
        ) -> Result<Option<EnrichmentDocument>, EnrichmentError> {
            self.document.clone()
        }

        fn collection_counts(&self) -> Result<Vec<CollectionCount>, EnrichmentError> {
            match &self.document {
                Err(err) => Err(err.clone()),
                Ok(_) => Ok(vec![CollectionCount {
                    collection: "movies_complete".to_string(),
                    documents: 1,
                }]),
            }
        }

        fn document_ids(&self, _max_docs: usize) -> Result<Option<Vec<String>>, EnrichmentError> {
            self.ids.clone()
        }
    }

    fn service_with(
        catalog: Arc<FakeCatalog>,
        enrichment: Arc<FakeEnrichment>,
        settings: QuerySettings,
    ) -> QueryService {
        QueryService::new(catalog, enrichment, settings)
    }

    fn service(enrichment: FakeEnrichment) -> QueryService {
        service_with(
            Arc::new(FakeCatalog::default()),
            Arc::new(enrichment),
            QuerySettings::default(),
        )
    }

    #[test]
    fn detail_merges_enrichment_when_available() {
        let detail = service(FakeEnrichment::with_document())
            .get_movie_detail(KNOWN_ID)
            .unwrap();
        assert_eq!(detail.movie.movie_id, KNOWN_ID);
        assert_eq!(
            detail.enrichment.document().unwrap().fields.get("tagline").unwrap(),
            "Fear can hold you prisoner"
        );
    }

    #[test]
    fn detail_degrades_when_document_missing() {
        let detail = service(FakeEnrichment::empty())
            .get_movie_detail(KNOWN_ID)
            .unwrap();
        assert_eq!(detail.movie, details(KNOWN_ID));
        assert_eq!(
            detail.enrichment,
            Enrichment::Degraded(DegradedReason::Missing)
        );
    }

    #[test]
    fn detail_degrades_when_enrichment_unreachable() {
        let detail = service(FakeEnrichment::unreachable())
            .get_movie_detail(KNOWN_ID)
            .unwrap();
        assert_eq!(detail.movie, details(KNOWN_ID));
        assert!(matches!(
            detail.enrichment,
            Enrichment::Degraded(DegradedReason::Unavailable(_))
        ));
    }

    #[test]
    fn detail_not_found_skips_enrichment() {
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_get_movie()
            .with(eq(UNKNOWN_ID))
            .times(1)
            .returning(|id| Err(CatalogError::NotFound(id.to_string())));
        let mut enrichment = MockEnrichmentStore::new();
        enrichment.expect_find_document().never();

        let service = QueryService::new(
            Arc::new(catalog),
            Arc::new(enrichment),
            QuerySettings::default(),
        );
        assert_eq!(
            service.get_movie_detail(UNKNOWN_ID),
            Err(QueryError::NotFound(UNKNOWN_ID.to_string()))
        );
    }

    #[test]
    fn catalog_failure_is_store_unavailable() {
        let service = service_with(
            Arc::new(FakeCatalog::unavailable()),
            Arc::new(FakeEnrichment::with_document()),
            QuerySettings::default(),
        );
        assert!(matches!(
            service.get_movie_detail(KNOWN_ID),
            Err(QueryError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.list_movies_filtered(&ListParams::default()),
            Err(QueryError::StoreUnavailable(_))
        ));
        assert!(matches!(service.stats(), Err(QueryError::StoreUnavailable(_))));
    }

    #[test]
    fn listing_passes_clamped_query_to_store() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service_with(
            catalog.clone(),
            Arc::new(FakeEnrichment::empty()),
            QuerySettings::default(),
        );

        let page = service
            .list_movies_filtered(&ListParams {
                page: Some(0),
                page_size: Some(500),
                rating_min: Some(12.0),
                ..Default::default()
            })
            .unwrap();
        assert!(page.items.len() <= page.page_size);
        assert!(page.total >= page.items.len());

        let queries = catalog.list_queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].page, 1);
        assert_eq!(queries[0].page_size, 100);
        assert_eq!(queries[0].filters.rating_min, Some(10.0));
        assert_eq!(queries[0].filters.only_ids, None);
    }

    #[test]
    fn inverted_year_range_does_not_hit_store() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service_with(
            catalog.clone(),
            Arc::new(FakeEnrichment::empty()),
            QuerySettings::default(),
        );

        let page = service
            .list_movies_filtered(&ListParams {
                year_min: Some(2023),
                year_max: Some(2015),
                ..Default::default()
            })
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert!(catalog.list_queries.lock().unwrap().is_empty());
    }

    #[test]
    fn listing_restricted_to_enriched_ids_when_configured() {
        let catalog = Arc::new(FakeCatalog::default());
        let mut enrichment = FakeEnrichment::empty();
        enrichment.ids = Ok(Some(vec![KNOWN_ID.to_string()]));
        let settings = QuerySettings {
            listing: ListingSettings {
                only_enriched_max_docs: Some(5000),
                ..Default::default()
            },
            ..Default::default()
        };
        let service = service_with(catalog.clone(), Arc::new(enrichment), settings.clone());

        service
            .list_movies_filtered(&ListParams::default())
            .unwrap();
        assert_eq!(
            catalog.list_queries.lock().unwrap()[0].filters.only_ids,
            Some(vec![KNOWN_ID.to_string()])
        );

        // Unreachable enrichment lifts the restriction
        let catalog = Arc::new(FakeCatalog::default());
        let service = service_with(
            catalog.clone(),
            Arc::new(FakeEnrichment::unreachable()),
            settings,
        );
        service
            .list_movies_filtered(&ListParams::default())
            .unwrap();
        assert_eq!(catalog.list_queries.lock().unwrap()[0].filters.only_ids, None);
    }

    #[test]
    fn empty_search_is_rejected() {
        let service = service(FakeEnrichment::empty());
        assert_eq!(service.search(""), Err(QueryError::EmptyQuery));
        assert_eq!(service.search("   \t"), Err(QueryError::EmptyQuery));
    }

    #[test]
    fn search_uses_configured_limits() {
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_search_entities()
            .with(eq("matrix"), eq(5), eq(3))
            .times(1)
            .returning(|_, _, _| {
                Ok(SearchResults {
                    movies: vec![summary("tt0133093", "The Matrix")],
                    persons: vec![],
                })
            });
        let settings = QuerySettings {
            search: SearchSettings {
                movies_limit: 5,
                persons_limit: 3,
            },
            ..Default::default()
        };
        let service = QueryService::new(
            Arc::new(catalog),
            Arc::new(MockEnrichmentStore::new()),
            settings,
        );

        let results = service.search("  matrix ").unwrap();
        assert_eq!(results.movies.len(), 1);
        assert!(results.persons.is_empty());
    }

    #[test]
    fn listing_leaves_enrichment_alone_unless_configured() {
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_list_movies()
            .withf(|query| query.filters.only_ids.is_none())
            .times(1)
            .returning(|query| Ok(MoviePage::empty(query.page, query.page_size)));
        let mut enrichment = MockEnrichmentStore::new();
        enrichment.expect_document_ids().never();

        let service = QueryService::new(
            Arc::new(catalog),
            Arc::new(enrichment),
            QuerySettings::default(),
        );
        let page = service
            .list_movies_filtered(&ListParams::default())
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn stats_passes_through() {
        let stats = service(FakeEnrichment::empty()).stats().unwrap();
        assert_eq!(stats.statistics.total_movies, 1);
        assert!((0.0..=10.0).contains(&stats.statistics.average_rating));
        assert_eq!(stats.rating_histogram.len(), 10);
        assert_eq!(stats.genres[0].genre, "Drama");
        assert_eq!(stats.top_actors[0].name, "Tim Robbins");
    }

    #[test]
    fn home_queries_top_and_recent() {
        let catalog = Arc::new(FakeCatalog::default());
        let service = service_with(
            catalog.clone(),
            Arc::new(FakeEnrichment::empty()),
            QuerySettings::default(),
        );

        let home = service.home().unwrap();
        assert_eq!(home.top_movies.len(), 1);
        assert_eq!(home.recent_movies.len(), 1);

        let queries = catalog.list_queries.lock().unwrap();
        assert_eq!(queries[0].page_size, HOME_TOP_COUNT);
        assert_eq!(queries[0].order.key, MovieOrderKey::Rating);
        assert_eq!(queries[0].filters.rating_min, Some(HOME_TOP_RATING_MIN));
        assert_eq!(queries[1].page_size, HOME_RECENT_COUNT);
        assert_eq!(queries[1].order.key, MovieOrderKey::Year);
        assert_eq!(queries[1].filters.year_min, Some(HOME_RECENT_YEAR_MIN));
    }

    #[test]
    fn storage_overview_flags_unreachable_enrichment() {
        let overview = service(FakeEnrichment::with_document())
            .storage_overview()
            .unwrap();
        assert!(overview.enrichment_available);
        assert_eq!(overview.enrichment_collections.len(), 1);
        assert_eq!(overview.catalog_tables[0].table, "movies");

        let overview = service(FakeEnrichment::unreachable())
            .storage_overview()
            .unwrap();
        assert!(!overview.enrichment_available);
        assert!(overview.enrichment_collections.is_empty());
        assert_eq!(overview.catalog_tables.len(), 1);
    }
}
