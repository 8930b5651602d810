//! Raw listing parameters and their normalization into a store query.

use crate::catalog_store::{MovieFilters, MovieListQuery, MovieOrder};
use crate::config::ListingSettings;
use std::collections::HashMap;

/// Listing request as received from a caller, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub order: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub rating_min: Option<f64>,
    pub genre: Option<String>,
    pub title_type: Option<String>,
}

/// What the service should do with a listing request.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedListing {
    Query(MovieListQuery),
    /// The filters can never match; answer with an empty page.
    Empty { page: usize, page_size: usize },
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_value<T: std::str::FromStr>(value: Option<&String>) -> Option<T> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .and_then(|s| s.parse().ok())
}

impl ListParams {
    /// Builds params from URL query pairs. Values that do not parse are
    /// treated as absent.
    pub fn from_query_map(query: &HashMap<String, String>) -> Self {
        Self {
            page: parse_value(query.get("page")),
            page_size: parse_value(query.get("page_size")),
            order: non_blank(query.get("order").or_else(|| query.get("sort"))),
            year_min: parse_value(query.get("year_min")),
            year_max: parse_value(query.get("year_max")),
            rating_min: parse_value(query.get("rating_min")),
            genre: non_blank(query.get("genre")),
            title_type: non_blank(query.get("title_type")),
        }
    }

    /// Clamps out-of-range values instead of rejecting them.
    pub fn normalize(&self, settings: &ListingSettings) -> NormalizedListing {
        let page = match self.page {
            Some(page) if page > 1 => page as usize,
            _ => 1,
        };
        let page_size = match self.page_size {
            Some(size) if size > 0 => (size as usize).min(settings.max_page_size),
            _ => settings.default_page_size,
        };

        if let (Some(min), Some(max)) = (self.year_min, self.year_max) {
            if min > max {
                return NormalizedListing::Empty { page, page_size };
            }
        }

        let order = self
            .order
            .as_deref()
            .and_then(MovieOrder::parse)
            .unwrap_or_default();
        let rating_min = self
            .rating_min
            .filter(|rating| !rating.is_nan())
            .map(|rating| rating.clamp(0.0, 10.0));

        NormalizedListing::Query(MovieListQuery {
            page,
            page_size,
            order,
            filters: MovieFilters {
                year_min: self.year_min,
                year_max: self.year_max,
                rating_min,
                genre: non_blank(self.genre.as_ref()),
                title_type: non_blank(self.title_type.as_ref()),
                only_ids: None,
            },
        })
    }
}
