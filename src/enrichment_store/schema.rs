//! SQLite schema definitions for the enrichment document database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// JSON documents grouped in named collections.
const DOCUMENTS_TABLE: Table = Table {
    name: "documents",
    columns: &[
        sqlite_column!("collection", &SqlType::Text, non_null = true),
        sqlite_column!("doc_id", &SqlType::Text, non_null = true), // movie id
        sqlite_column!("body", &SqlType::Text, non_null = true), // JSON object
    ],
    primary_key: &["collection", "doc_id"],
    indices: &[],
};

pub const ENRICHMENT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[DOCUMENTS_TABLE],
}];
