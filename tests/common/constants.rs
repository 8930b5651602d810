//! Shared constants for end-to-end tests
//!
//! When the fixture catalog changes, update only this file.

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// "The Shawshank Redemption" (1994), rated 9.3, enriched
pub const SHAWSHANK_ID: &str = "tt0111161";

/// "The Godfather" (1972), rated 9.2, enriched
pub const GODFATHER_ID: &str = "tt0068646";

/// "The Matrix" (1999), rated 8.7, no enrichment document
pub const MATRIX_ID: &str = "tt0133093";

/// "Inception" (2010), rated 8.8, no enrichment document
pub const INCEPTION_ID: &str = "tt1375666";

/// "Unrated Indie" (2015), no rating row
pub const UNRATED_ID: &str = "tt9000001";

/// Id that exists in neither store
pub const MISSING_MOVIE_ID: &str = "tt9999999";

/// Number of titles in the fixture catalog
pub const TOTAL_MOVIES: usize = 5;

/// Number of persons in the fixture catalog
pub const TOTAL_PERSONS: usize = 4;

/// Number of documents in the fixture enrichment collection
pub const ENRICHED_MOVIES: usize = 2;

// ============================================================================
// Timeouts
// ============================================================================

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a spawned server to answer
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
