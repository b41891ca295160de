//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the news article index.

use serde_json::{json, Value};

/// Default name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "news";

/// Get the index settings and mappings for the news article index.
///
/// The configuration includes:
/// - **text**: Analyzed full-text fields for title and content
/// - **keyword**: Exact-match author field for filtering and aggregations
/// - **date**: Publication time in the canonical timestamp form, with epoch
///   milliseconds accepted as well
///
/// Fields that are not listed are mapped dynamically.
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "title": {
                    "type": "text"
                },
                "content": {
                    "type": "text"
                },
                "author": {
                    "type": "keyword"
                },
                "published_at": {
                    "type": "date",
                    "format": "strict_date_optional_time||epoch_millis"
                }
            }
        }
    })
}
