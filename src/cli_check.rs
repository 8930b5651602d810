//! Checks that a catalog database has the tables and columns the server
//! reads, and prints their row counts.

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cineexplorer_server::catalog_store::{latest_catalog_schema, REQUIRED_TABLES};
use cineexplorer_server::enrichment_store::{
    EnrichmentStore, SqliteEnrichmentStore, DEFAULT_COLLECTION,
};
use cineexplorer_server::sqlite_persistence::TableReport;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(value_parser = parse_path)]
    pub catalog_db: PathBuf,

    /// Optional enrichment database to report document counts for.
    #[clap(long, value_parser = parse_path)]
    pub enrichment_db: Option<PathBuf>,

    /// Enrichment collection expected to hold per-movie documents.
    #[clap(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,
}

fn row_count(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |r| {
        r.get(0)
    })
    .with_context(|| format!("Failed to count rows of {}", table))
}

/// Prints one line per expected table. Returns false when a required table
/// does not match.
fn check_catalog(path: &Path) -> Result<bool> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open catalog database {:?}", path))?;

    println!("Catalog: {}", path.display());
    let mut all_required_ok = true;
    for report in latest_catalog_schema().inspect(&conn)? {
        let required = REQUIRED_TABLES.contains(&report.table);
        print_report(&conn, &report, required)?;
        if required && !report.is_ok() {
            all_required_ok = false;
        }
    }
    Ok(all_required_ok)
}

fn print_report(conn: &Connection, report: &TableReport, required: bool) -> Result<()> {
    let suffix = if required { "" } else { " (optional)" };
    if report.exists {
        println!("  {}{}: {} rows", report, suffix, row_count(conn, report.table)?);
    } else {
        println!("  {}{}", report, suffix);
    }
    Ok(())
}

fn check_enrichment(path: &Path, collection: &str) {
    println!("Enrichment: {}", path.display());
    let store = SqliteEnrichmentStore::new(path, collection, std::time::Duration::from_secs(3));
    match store.collection_counts() {
        Ok(counts) if counts.is_empty() => println!("  no documents"),
        Ok(counts) => {
            for count in counts {
                let marker = if count.collection == store.collection() {
                    " *"
                } else {
                    ""
                };
                println!("  {}: {} documents{}", count.collection, count.documents, marker);
            }
        }
        Err(err) => println!("  [UNAVAILABLE] {}", err),
    }
}

fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    let catalog_ok = check_catalog(&cli_args.catalog_db)?;
    if let Some(enrichment_db) = &cli_args.enrichment_db {
        check_enrichment(enrichment_db, &cli_args.collection);
    }

    if catalog_ok {
        println!("Catalog schema OK");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Catalog schema does not match");
        Ok(ExitCode::FAILURE)
    }
}
