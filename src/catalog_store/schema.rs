//! SQLite schema definitions for the IMDB catalog database.
//!
//! The catalog file is produced by an external import; these definitions are
//! used to validate it on open and to build fixture databases in tests.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const MOVIE_FK: ForeignKey = ForeignKey {
    foreign_table: "movies",
    foreign_column: "movie_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PERSON_FK: ForeignKey = ForeignKey {
    foreign_table: "persons",
    foreign_column: "person_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Core Tables
// =============================================================================

const MOVIES_TABLE: Table = Table {
    name: "movies",
    columns: &[
        sqlite_column!("movie_id", &SqlType::Text, is_primary_key = true), // tt0111161
        sqlite_column!("title_type", &SqlType::Text, non_null = true), // movie, short, tvSeries...
        sqlite_column!("primary_title", &SqlType::Text, non_null = true),
        sqlite_column!("original_title", &SqlType::Text),
        sqlite_column!("is_adult", &SqlType::Integer, non_null = true),
        sqlite_column!("start_year", &SqlType::Integer),
        sqlite_column!("end_year", &SqlType::Integer),
        sqlite_column!("runtime_minutes", &SqlType::Integer),
    ],
    primary_key: &[],
    indices: &[],
};

const PERSONS_TABLE: Table = Table {
    name: "persons",
    columns: &[
        sqlite_column!("person_id", &SqlType::Text, is_primary_key = true), // nm0000151
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("birth_year", &SqlType::Integer),
        sqlite_column!("death_year", &SqlType::Integer),
    ],
    primary_key: &[],
    indices: &[],
};

const RATINGS_TABLE: Table = Table {
    name: "ratings",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            is_primary_key = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("average_rating", &SqlType::Real, non_null = true),
        sqlite_column!("num_votes", &SqlType::Integer, non_null = true),
    ],
    primary_key: &[],
    indices: &[],
};

// =============================================================================
// Relationship Tables
// =============================================================================

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    primary_key: &["movie_id", "genre"],
    indices: &[],
};

const PRINCIPALS_TABLE: Table = Table {
    name: "principals",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!("ordering", &SqlType::Integer, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true), // actor, actress, director...
        sqlite_column!("job", &SqlType::Text),
    ],
    primary_key: &["movie_id", "person_id", "ordering"],
    indices: &[],
};

const DIRECTORS_TABLE: Table = Table {
    name: "directors",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
    ],
    primary_key: &["movie_id", "person_id"],
    indices: &[],
};

const WRITERS_TABLE: Table = Table {
    name: "writers",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
    ],
    primary_key: &["movie_id", "person_id"],
    indices: &[],
};

/// Character names played by a person in a movie.
const CHARACTERS_TABLE: Table = Table {
    name: "characters",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    primary_key: &["movie_id", "person_id", "name"],
    indices: &[],
};

/// Alternate titles by region.
const TITLES_TABLE: Table = Table {
    name: "titles",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!("region", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
    ],
    primary_key: &["movie_id", "region"],
    indices: &[],
};

const KNOWN_FOR_MOVIES_TABLE: Table = Table {
    name: "knownformovies",
    columns: &[
        sqlite_column!(
            "movie_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&MOVIE_FK)
        ),
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
    ],
    primary_key: &["movie_id", "person_id"],
    indices: &[],
};

const PROFESSIONS_TABLE: Table = Table {
    name: "professions",
    columns: &[
        sqlite_column!(
            "person_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PERSON_FK)
        ),
        sqlite_column!("job_name", &SqlType::Text, non_null = true),
    ],
    primary_key: &["person_id", "job_name"],
    indices: &[],
};

/// Tables the read path depends on. A catalog missing any of these is rejected at open.
pub const REQUIRED_TABLES: &[&str] = &[
    "movies",
    "ratings",
    "genres",
    "persons",
    "principals",
    "directors",
    "writers",
    "characters",
    "titles",
];

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        MOVIES_TABLE,
        PERSONS_TABLE,
        RATINGS_TABLE,
        GENRES_TABLE,
        PRINCIPALS_TABLE,
        DIRECTORS_TABLE,
        WRITERS_TABLE,
        CHARACTERS_TABLE,
        TITLES_TABLE,
        KNOWN_FOR_MOVIES_TABLE,
        PROFESSIONS_TABLE,
    ],
}];

/// Schema the catalog is expected to match.
pub fn latest_catalog_schema() -> &'static VersionedSchema {
    &CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1]
}
