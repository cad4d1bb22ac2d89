//! Query layer for watching services in a catalog.
//!
//! Parse query text with [`query::parse`], look it up with [`fetch::fetch`]
//! against any [`catalog::CatalogClient`], and use the query's `Display`
//! form as a stable key for logging and deduplication.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod query;

pub use catalog::{CatalogClient, QueryMeta, QueryOptions};
pub use error::{ClientError, FetchError, ParseError};
pub use fetch::fetch;
pub use query::{parse, ServiceQuery};
