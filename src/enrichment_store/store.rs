//! SQLite-backed enrichment document store.
//!
//! Documents live as JSON text in a separate database file that is maintained
//! outside this service. The file may be missing or unreadable at any time,
//! so the connection is opened lazily and dropped again after any failure.

use super::error::EnrichmentError;
use super::models::{CollectionCount, EnrichmentDocument};
use super::schema::ENRICHMENT_VERSIONED_SCHEMAS;
use super::trait_def::EnrichmentStore;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collection holding the per-movie aggregates.
pub const DEFAULT_COLLECTION: &str = "movies_complete";

/// Maximum number of collections reported by `collection_counts`.
const MAX_REPORTED_COLLECTIONS: i64 = 20;

/// SQLite-backed enrichment store.
#[derive(Clone)]
pub struct SqliteEnrichmentStore {
    db_path: PathBuf,
    collection: String,
    busy_timeout: Duration,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteEnrichmentStore {
    /// Create a new SqliteEnrichmentStore.
    ///
    /// Never fails: an unreachable database only makes lookups report
    /// `Unavailable` until it becomes readable.
    pub fn new<P: AsRef<Path>>(db_path: P, collection: &str, busy_timeout: Duration) -> Self {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
            collection: collection.to_string(),
            busy_timeout,
            conn: Arc::new(Mutex::new(None)),
        };

        match store.with_conn(|conn| count_documents(conn, &store.collection)) {
            Ok(count) => info!(
                "Enrichment store ready: {} documents in collection {}",
                count, store.collection
            ),
            Err(e) => warn!(
                "Enrichment store at {:?} not reachable yet, movie details will be served without enrichment: {}",
                store.db_path, e
            ),
        }
        store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn open(&self) -> Result<Connection, EnrichmentError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| EnrichmentError::Unavailable(format!("cannot open {:?}: {}", self.db_path, e)))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        let schema = &ENRICHMENT_VERSIONED_SCHEMAS[ENRICHMENT_VERSIONED_SCHEMAS.len() - 1];
        schema
            .validate(&conn)
            .map_err(|e| EnrichmentError::Unavailable(e.to_string()))?;

        debug!("Opened enrichment database {:?}", self.db_path);
        Ok(conn)
    }

    /// Runs `f` on the cached connection, opening it first if needed.
    /// Any SQLite failure discards the connection so the next call reconnects.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, EnrichmentError> {
        let mut guard = self.conn.lock().unwrap();
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        let conn = match guard.as_ref() {
            Some(conn) => conn,
            None => return Err(EnrichmentError::Unavailable("no connection".to_string())),
        };
        match f(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                *guard = None;
                Err(EnrichmentError::Unavailable(e.to_string()))
            }
        }
    }
}

fn count_documents(conn: &Connection, collection: &str) -> rusqlite::Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        params![collection],
        |r| r.get::<_, i64>(0),
    )
    .map(|count| count as usize)
}

/// Parses a stored body into document fields. The `_id` key duplicates the
/// document id and is dropped.
fn parse_document(movie_id: &str, body: &str) -> Result<EnrichmentDocument, EnrichmentError> {
    let value: Value = serde_json::from_str(body).map_err(|e| EnrichmentError::Malformed {
        id: movie_id.to_string(),
        reason: e.to_string(),
    })?;
    let mut fields: Map<String, Value> = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(EnrichmentError::Malformed {
                id: movie_id.to_string(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            })
        }
    };
    fields.remove("_id");
    Ok(EnrichmentDocument {
        movie_id: movie_id.to_string(),
        fields,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl EnrichmentStore for SqliteEnrichmentStore {
    fn find_document(&self, movie_id: &str) -> Result<Option<EnrichmentDocument>, EnrichmentError> {
        let body: Option<String> = self.with_conn(|conn| {
            conn.prepare_cached("SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2")?
                .query_row(params![self.collection, movie_id], |row| row.get(0))
                .optional()
        })?;

        body.map(|body| parse_document(movie_id, &body)).transpose()
    }

    fn collection_counts(&self) -> Result<Vec<CollectionCount>, EnrichmentError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT collection, COUNT(*) FROM documents
                 GROUP BY collection
                 ORDER BY collection
                 LIMIT ?1",
            )?;
            let counts = stmt
                .query_map(params![MAX_REPORTED_COLLECTIONS], |row| {
                    Ok(CollectionCount {
                        collection: row.get(0)?,
                        documents: row.get::<_, i64>(1)? as usize,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(counts)
        })
    }

    fn document_ids(&self, max_docs: usize) -> Result<Option<Vec<String>>, EnrichmentError> {
        self.with_conn(|conn| {
            let count = count_documents(conn, &self.collection)?;
            if count == 0 || count > max_docs {
                return Ok(None);
            }
            let mut stmt = conn.prepare_cached(
                "SELECT doc_id FROM documents WHERE collection = ?1 ORDER BY doc_id",
            )?;
            let ids = stmt
                .query_map(params![self.collection], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(ids))
        })
    }
}
