mod error;
mod models;
mod schema;
mod store;
mod trait_def;

pub use error::CatalogError;
pub use models::*;
pub use schema::{latest_catalog_schema, CATALOG_VERSIONED_SCHEMAS, REQUIRED_TABLES};
pub use store::SqliteCatalogStore;
#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockCatalogStore;
pub use trait_def::CatalogStore;
