//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend.

mod bulk;
mod client;
mod index_config;

pub use bulk::{build_bulk_body, parse_bulk_response};
pub use client::OpenSearchClient;
pub use index_config::{get_index_settings, DEFAULT_INDEX_NAME};
