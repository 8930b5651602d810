//! Test fixture creation for the catalog and enrichment databases
//!
//! Both databases are built with direct SQL inserts since the stores only
//! ever open them read-only.

use super::constants::*;
use anyhow::Result;
use cineexplorer_server::catalog_store::latest_catalog_schema;
use cineexplorer_server::enrichment_store::{DEFAULT_COLLECTION, ENRICHMENT_VERSIONED_SCHEMAS};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary catalog with 5 titles and 4 persons
/// Returns (temp_dir, catalog_db_path)
pub fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("imdb.db");
    let conn = Connection::open(&db_path)?;
    latest_catalog_schema().create(&conn)?;

    let movies: &[(&str, &str, Option<i32>, Option<i32>, Option<(f64, i64)>, &[&str])] = &[
        (SHAWSHANK_ID, "The Shawshank Redemption", Some(1994), Some(142), Some((9.3, 2_800_000)), &["Drama"]),
        (GODFATHER_ID, "The Godfather", Some(1972), Some(175), Some((9.2, 1_900_000)), &["Crime", "Drama"]),
        (MATRIX_ID, "The Matrix", Some(1999), Some(136), Some((8.7, 2_000_000)), &["Action", "Sci-Fi"]),
        (INCEPTION_ID, "Inception", Some(2010), Some(148), Some((8.8, 2_500_000)), &["Action", "Sci-Fi"]),
        (UNRATED_ID, "Unrated Indie", Some(2015), None, None, &["Drama"]),
    ];
    for (id, title, year, runtime, rating, genres) in movies {
        conn.execute(
            "INSERT INTO movies (movie_id, title_type, primary_title, original_title, is_adult, start_year, runtime_minutes)
             VALUES (?1, 'movie', ?2, ?2, 0, ?3, ?4)",
            params![id, title, year, runtime],
        )?;
        if let Some((average, votes)) = rating {
            conn.execute(
                "INSERT INTO ratings VALUES (?1, ?2, ?3)",
                params![id, average, votes],
            )?;
        }
        for genre in genres.iter() {
            conn.execute("INSERT INTO genres VALUES (?1, ?2)", params![id, genre])?;
        }
    }

    let persons: &[(&str, &str, Option<i32>, Option<i32>)] = &[
        ("nm0000209", "Tim Robbins", Some(1958), None),
        ("nm0000151", "Morgan Freeman", Some(1937), None),
        ("nm0001104", "Frank Darabont", Some(1959), None),
        ("nm0000206", "Keanu Reeves", Some(1964), None),
    ];
    for (id, name, birth, death) in persons {
        conn.execute(
            "INSERT INTO persons VALUES (?1, ?2, ?3, ?4)",
            params![id, name, birth, death],
        )?;
    }

    for (movie, person, ordering, category) in [
        (SHAWSHANK_ID, "nm0000209", 1, "actor"),
        (SHAWSHANK_ID, "nm0000151", 2, "actor"),
        (SHAWSHANK_ID, "nm0001104", 3, "director"),
        (MATRIX_ID, "nm0000206", 1, "actor"),
    ] {
        conn.execute(
            "INSERT INTO principals (movie_id, person_id, ordering, category) VALUES (?1, ?2, ?3, ?4)",
            params![movie, person, ordering, category],
        )?;
    }
    conn.execute(
        "INSERT INTO directors VALUES (?1, 'nm0001104')",
        params![SHAWSHANK_ID],
    )?;
    conn.execute(
        "INSERT INTO characters VALUES (?1, 'nm0000209', 'Andy Dufresne')",
        params![SHAWSHANK_ID],
    )?;
    conn.execute(
        "INSERT INTO titles VALUES (?1, 'IT', 'Le ali della libertà')",
        params![SHAWSHANK_ID],
    )?;

    Ok((dir, db_path))
}

/// Creates a temporary enrichment database with documents for Shawshank and
/// The Godfather
/// Returns (temp_dir, enrichment_db_path)
pub fn create_test_enrichment_db() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("enrichment.db");
    let conn = Connection::open(&db_path)?;
    ENRICHMENT_VERSIONED_SCHEMAS[0].create(&conn)?;

    let docs = [
        (
            SHAWSHANK_ID,
            r#"{"_id": "tt0111161", "tagline": "Fear can hold you prisoner. Hope can set you free.", "budget": 25000000}"#,
        ),
        (
            GODFATHER_ID,
            r#"{"_id": "tt0068646", "tagline": "An offer you can't refuse.", "budget": 6000000}"#,
        ),
    ];
    for (id, body) in docs {
        conn.execute(
            "INSERT INTO documents VALUES (?1, ?2, ?3)",
            params![DEFAULT_COLLECTION, id, body],
        )?;
    }
    conn.execute(
        "INSERT INTO documents VALUES ('persons', 'nm0000151', '{\"name\": \"Morgan Freeman\"}')",
        [],
    )?;

    Ok((dir, db_path))
}
