//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides one method per API endpoint.
//! When API routes or query formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET / - uptime and build hash
    pub async fn server_info(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Movies
    // ========================================================================

    /// GET /v1/movies with the given query parameters
    pub async fn get_movies(&self, query: &[(&str, &str)]) -> Response {
        self.get_with_query("/v1/movies", query).await
    }

    /// GET /v1/movies/{id}
    pub async fn get_movie(&self, id: &str) -> Response {
        self.get(&format!("/v1/movies/{}", id)).await
    }

    /// GET /v1/home
    pub async fn get_home(&self) -> Response {
        self.get("/v1/home").await
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// GET /v1/search?q=...
    pub async fn search(&self, query: &str) -> Response {
        self.get_with_query("/v1/search", &[("q", query)]).await
    }

    /// GET /v1/search without any query parameter
    pub async fn search_without_query(&self) -> Response {
        self.get("/v1/search").await
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// GET /v1/stats
    pub async fn get_stats(&self) -> Response {
        self.get("/v1/stats").await
    }

    /// GET /v1/genres
    pub async fn get_genres(&self) -> Response {
        self.get("/v1/genres").await
    }

    /// GET /v1/storage
    pub async fn get_storage(&self) -> Response {
        self.get("/v1/storage").await
    }
}
