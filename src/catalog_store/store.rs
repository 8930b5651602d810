//! SQLite-backed catalog store implementation for the IMDB schema.
//!
//! The catalog file is opened read-only; every query runs on one of a small
//! pool of connections picked round robin.

use super::error::CatalogError;
use super::models::*;
use super::schema::{latest_catalog_schema, REQUIRED_TABLES};
use super::trait_def::CatalogStore;
use crate::server::metrics;
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum number of cast members returned with a movie.
const CAST_LIMIT: usize = 20;
/// Maximum number of alternate titles returned with a movie.
const ALTERNATE_TITLES_LIMIT: usize = 25;
/// Number of rating histogram buckets, `[0, 1)` up to `[9, 10]`.
const RATING_BUCKETS: u8 = 10;

/// Columns shared by every query producing a `MovieSummary`, see `parse_summary_row`.
const SUMMARY_COLUMNS: &str = "m.movie_id, m.primary_title, m.original_title, m.title_type, \
     m.start_year, r.average_rating, r.num_votes, \
     (SELECT GROUP_CONCAT(g.genre) FROM genres g WHERE g.movie_id = m.movie_id)";

/// SQLite-backed, read-only catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn open_read_conn(db_path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
            | rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Rejects catalogs missing a table or column the read path depends on.
fn validate_schema(conn: &Connection) -> Result<()> {
    for report in latest_catalog_schema().inspect(conn)? {
        if report.is_ok() {
            continue;
        }
        if REQUIRED_TABLES.contains(&report.table) {
            return Err(CatalogError::Schema(report.to_string()).into());
        }
        warn!("Optional catalog table does not match: {}", report);
    }
    Ok(())
}

impl SqliteCatalogStore {
    /// Open an existing catalog database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite catalog file, which must already exist
    /// * `read_pool_size` - Number of connections for concurrent read operations
    /// * `busy_timeout` - How long a query waits on a locked database before failing
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        read_pool_size: usize,
        busy_timeout: Duration,
    ) -> Result<Self> {
        let db_path_ref = db_path.as_ref();
        let read_pool_size = read_pool_size.max(1);

        let first_conn = open_read_conn(db_path_ref, busy_timeout)?;
        validate_schema(&first_conn)?;

        let movie_count: i64 = first_conn.query_row("SELECT COUNT(*) FROM movies", [], |r| r.get(0))?;
        let person_count: i64 =
            first_conn.query_row("SELECT COUNT(*) FROM persons", [], |r| r.get(0))?;
        info!(
            "Opened IMDB catalog: {} movies, {} persons",
            movie_count, person_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size);
        read_pool.push(Arc::new(Mutex::new(first_conn)));
        for _ in 1..read_pool_size {
            let read_conn = open_read_conn(db_path_ref, busy_timeout)?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    // =========================================================================
    // Internal Helper Methods
    // =========================================================================

    fn parse_summary_row(row: &rusqlite::Row) -> rusqlite::Result<MovieSummary> {
        Ok(MovieSummary {
            movie_id: row.get(0)?,
            primary_title: row.get(1)?,
            original_title: row.get(2)?,
            title_type: row.get(3)?,
            start_year: row.get(4)?,
            average_rating: row.get(5)?,
            num_votes: row.get(6)?,
            genres: split_genres(row.get::<_, Option<String>>(7)?),
        })
    }

    /// WHERE clause and its positional arguments for the listing filters.
    fn filters_to_sql(filters: &MovieFilters) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = vec![];
        let mut args: Vec<Value> = vec![];

        if let Some(year_min) = filters.year_min {
            clauses.push("m.start_year >= ?".to_string());
            args.push(Value::Integer(year_min as i64));
        }
        if let Some(year_max) = filters.year_max {
            clauses.push("m.start_year <= ?".to_string());
            args.push(Value::Integer(year_max as i64));
        }
        if let Some(rating_min) = filters.rating_min {
            clauses.push("r.average_rating >= ?".to_string());
            args.push(Value::Real(rating_min));
        }
        if let Some(title_type) = &filters.title_type {
            clauses.push("m.title_type = ?".to_string());
            args.push(Value::Text(title_type.clone()));
        }
        if let Some(genre) = &filters.genre {
            clauses.push(
                "EXISTS (SELECT 1 FROM genres g WHERE g.movie_id = m.movie_id \
                 AND g.genre = ? COLLATE NOCASE)"
                    .to_string(),
            );
            args.push(Value::Text(genre.clone()));
        }
        if let Some(ids) = &filters.only_ids {
            // One JSON array argument, whatever the number of ids.
            clauses.push("m.movie_id IN (SELECT value FROM json_each(?))".to_string());
            args.push(Value::Text(serde_json::Value::from(ids.clone()).to_string()));
        }

        if clauses.is_empty() {
            (String::new(), args)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), args)
        }
    }

    fn get_credits(conn: &Connection, table: &str, movie_id: &str) -> rusqlite::Result<Vec<Credit>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT p.person_id, p.name FROM {} c
             JOIN persons p ON p.person_id = c.person_id
             WHERE c.movie_id = ?1
             ORDER BY p.name, p.person_id",
            table
        ))?;
        let credits = stmt
            .query_map(params![movie_id], |row| {
                Ok(Credit {
                    person_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(credits)
    }

    fn get_cast(conn: &Connection, movie_id: &str) -> rusqlite::Result<Vec<CastMember>> {
        let mut characters: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt = conn.prepare_cached(
            "SELECT person_id, name FROM characters WHERE movie_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![movie_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (person_id, name) = row?;
            characters.entry(person_id).or_default().push(name);
        }

        let mut stmt = conn.prepare_cached(
            "SELECT p.person_id, p.name, pr.category, pr.ordering
             FROM principals pr
             JOIN persons p ON p.person_id = pr.person_id
             WHERE pr.movie_id = ?1 AND pr.category IN ('actor', 'actress')
             ORDER BY pr.ordering ASC
             LIMIT ?2",
        )?;
        let cast = stmt
            .query_map(params![movie_id, CAST_LIMIT as i64], |row| {
                let person_id: String = row.get(0)?;
                Ok(CastMember {
                    characters: characters.get(&person_id).cloned().unwrap_or_default(),
                    person_id,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    ordering: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cast)
    }

    fn get_alternate_titles(
        conn: &Connection,
        movie_id: &str,
    ) -> rusqlite::Result<Vec<AlternateTitle>> {
        let mut stmt =
            conn.prepare_cached("SELECT title, region FROM titles WHERE movie_id = ?1")?;
        let mut titles = stmt
            .query_map(params![movie_id], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(title, region)| {
                let title = title?.trim().to_string();
                if title.is_empty() {
                    return None;
                }
                Some(AlternateTitle {
                    region: normalize_region(region.as_deref()),
                    title,
                })
            })
            .collect::<Vec<_>>();

        // Titles without a region go last.
        titles.sort_by(|a, b| {
            (a.region.is_none(), &a.region, &a.title).cmp(&(b.region.is_none(), &b.region, &b.title))
        });
        titles.truncate(ALTERNATE_TITLES_LIMIT);
        Ok(titles)
    }
}

/// Splits a `GROUP_CONCAT` genre list into sorted, de-duplicated names.
fn split_genres(csv: Option<String>) -> Vec<String> {
    let mut genres: Vec<String> = csv
        .unwrap_or_default()
        .split(',')
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(|g| g.to_string())
        .collect();
    genres.sort();
    genres.dedup();
    genres
}

/// The IMDB dump encodes a missing region in several ways.
fn normalize_region(region: Option<&str>) -> Option<String> {
    let region = region?.trim();
    if region.is_empty() || region == "\\N" || region == "None" {
        return None;
    }
    if region.eq_ignore_ascii_case("nan") || region.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(region.to_string())
}

/// Escapes LIKE wildcards so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl CatalogStore for SqliteCatalogStore {
    fn list_movies(&self, query: &MovieListQuery) -> Result<MoviePage, CatalogError> {
        let start = Instant::now();
        if query.filters.only_ids.as_ref().is_some_and(|ids| ids.is_empty()) {
            return Ok(MoviePage::empty(query.page, query.page_size));
        }

        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let (where_sql, mut args) = Self::filters_to_sql(&query.filters);

        let total: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM movies m
                 LEFT JOIN ratings r ON r.movie_id = m.movie_id
                 {}",
                where_sql
            ),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let order_expr = query.order.key.sql_expression();
        let sql = format!(
            "SELECT {} FROM movies m
             LEFT JOIN ratings r ON r.movie_id = m.movie_id
             {}
             ORDER BY ({} IS NULL) ASC, {} {}, m.movie_id ASC
             LIMIT ? OFFSET ?",
            SUMMARY_COLUMNS,
            where_sql,
            order_expr,
            order_expr,
            query.order.direction.as_sql()
        );
        args.push(Value::Integer(query.page_size as i64));
        args.push(Value::Integer(i64::try_from(query.offset()).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(args.iter()), Self::parse_summary_row)?
            .collect::<Result<Vec<_>, _>>()?;

        metrics::record_db_query("list_movies", start.elapsed());
        Ok(MoviePage {
            items,
            total: total as usize,
            page: query.page,
            page_size: query.page_size,
        })
    }

    fn get_movie(&self, movie_id: &str) -> Result<MovieDetails, CatalogError> {
        let start = Instant::now();
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let details = conn
            .query_row(
                "SELECT m.movie_id, m.title_type, m.primary_title, m.original_title, m.is_adult,
                        m.start_year, m.end_year, m.runtime_minutes,
                        r.average_rating, r.num_votes,
                        (SELECT GROUP_CONCAT(g.genre) FROM genres g WHERE g.movie_id = m.movie_id)
                 FROM movies m
                 LEFT JOIN ratings r ON r.movie_id = m.movie_id
                 WHERE m.movie_id = ?1",
                params![movie_id],
                |row| {
                    Ok(MovieDetails {
                        movie_id: row.get(0)?,
                        title_type: row.get(1)?,
                        primary_title: row.get(2)?,
                        original_title: row.get(3)?,
                        is_adult: row.get::<_, i64>(4)? != 0,
                        start_year: row.get(5)?,
                        end_year: row.get(6)?,
                        runtime_minutes: row.get(7)?,
                        average_rating: row.get(8)?,
                        num_votes: row.get(9)?,
                        genres: split_genres(row.get(10)?),
                        directors: vec![],
                        writers: vec![],
                        cast: vec![],
                        alternate_titles: vec![],
                    })
                },
            )
            .optional()?;

        let mut details = match details {
            Some(details) => details,
            None => {
                debug!("Movie {} not in catalog", movie_id);
                return Err(CatalogError::NotFound(movie_id.to_string()));
            }
        };

        details.directors = Self::get_credits(&conn, "directors", movie_id)?;
        details.writers = Self::get_credits(&conn, "writers", movie_id)?;
        details.cast = Self::get_cast(&conn, movie_id)?;
        details.alternate_titles = Self::get_alternate_titles(&conn, movie_id)?;

        metrics::record_db_query("get_movie", start.elapsed());
        Ok(details)
    }

    fn search_entities(
        &self,
        query: &str,
        movies_limit: usize,
        persons_limit: usize,
    ) -> Result<SearchResults, CatalogError> {
        let start = Instant::now();
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let pattern = like_pattern(query);

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM movies m
             LEFT JOIN ratings r ON r.movie_id = m.movie_id
             WHERE m.title_type = 'movie'
               AND (m.primary_title LIKE ?1 ESCAPE '\\' OR m.original_title LIKE ?1 ESCAPE '\\')
             ORDER BY (r.average_rating IS NULL) ASC, r.average_rating DESC,
                      (r.num_votes IS NULL) ASC, r.num_votes DESC,
                      m.movie_id ASC
             LIMIT ?2",
            SUMMARY_COLUMNS
        ))?;
        let movies = stmt
            .query_map(
                params![pattern, movies_limit as i64],
                Self::parse_summary_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare_cached(
            "SELECT person_id, name, birth_year, death_year FROM persons
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name, person_id
             LIMIT ?2",
        )?;
        let persons = stmt
            .query_map(params![pattern, persons_limit as i64], |row| {
                Ok(PersonSummary {
                    person_id: row.get(0)?,
                    name: row.get(1)?,
                    birth_year: row.get(2)?,
                    death_year: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        metrics::record_db_query("search_entities", start.elapsed());
        Ok(SearchResults { movies, persons })
    }

    fn compute_statistics(&self) -> Result<CatalogStatistics, CatalogError> {
        let start = Instant::now();
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let total_movies: i64 = conn.query_row("SELECT COUNT(*) FROM movies", [], |r| r.get(0))?;
        let total_persons: i64 =
            conn.query_row("SELECT COUNT(*) FROM persons", [], |r| r.get(0))?;
        let (rated_movies, average_rating, average_votes): (i64, Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT COUNT(*), AVG(average_rating), AVG(num_votes) FROM ratings",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;

        metrics::record_db_query("compute_statistics", start.elapsed());
        Ok(CatalogStatistics {
            total_movies: total_movies as usize,
            total_persons: total_persons as usize,
            rated_movies: rated_movies as usize,
            average_rating: average_rating.unwrap_or(0.0),
            average_votes: average_votes.unwrap_or(0.0),
        })
    }

    fn genre_counts(&self, limit: usize) -> Result<Vec<GenreCount>, CatalogError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT genre, COUNT(DISTINCT movie_id) AS cnt
             FROM genres
             WHERE genre IS NOT NULL AND TRIM(genre) <> ''
             GROUP BY genre
             ORDER BY cnt DESC, genre ASC
             LIMIT ?1",
        )?;
        let genres = stmt
            .query_map(params![limit as i64], |row| {
                Ok(GenreCount {
                    genre: row.get(0)?,
                    movies: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn decade_counts(&self) -> Result<Vec<DecadeCount>, CatalogError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT (start_year / 10) * 10 AS decade, COUNT(*)
             FROM movies
             WHERE start_year IS NOT NULL
             GROUP BY decade
             ORDER BY decade",
        )?;
        let decades = stmt
            .query_map([], |row| {
                Ok(DecadeCount {
                    decade: row.get(0)?,
                    movies: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decades)
    }

    fn rating_histogram(&self) -> Result<Vec<RatingBucket>, CatalogError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT MAX(MIN(CAST(average_rating AS INTEGER), ?1), 0) AS bucket, COUNT(*)
             FROM ratings
             GROUP BY bucket",
        )?;
        let mut counts: HashMap<u8, usize> = HashMap::new();
        let rows = stmt.query_map(params![(RATING_BUCKETS - 1) as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (bucket, movies) = row?;
            counts.insert(bucket as u8, movies as usize);
        }

        Ok((0..RATING_BUCKETS)
            .map(|bucket| RatingBucket {
                bucket,
                movies: counts.get(&bucket).copied().unwrap_or(0),
            })
            .collect())
    }

    fn top_actors(&self, limit: usize) -> Result<Vec<ActorCredits>, CatalogError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT p.person_id, p.name, COUNT(DISTINCT pr.movie_id) AS cnt
             FROM principals pr
             JOIN persons p ON p.person_id = pr.person_id
             WHERE pr.category IN ('actor', 'actress')
             GROUP BY p.person_id
             ORDER BY cnt DESC, p.name ASC
             LIMIT ?1",
        )?;
        let actors = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ActorCredits {
                    person_id: row.get(0)?,
                    name: row.get(1)?,
                    movies: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(actors)
    }

    fn table_counts(&self) -> Result<Vec<TableCount>, CatalogError> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare_cached(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(tables.len());
        for table in tables {
            if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                continue;
            }
            let rows: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            counts.push(TableCount {
                table,
                rows: rows as usize,
            });
        }
        Ok(counts)
    }
}
