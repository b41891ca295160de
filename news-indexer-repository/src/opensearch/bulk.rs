//! Bulk request builder and response parser.
//!
//! Kept free of I/O so the wire format can be tested without a cluster.

use opensearch::http::request::JsonBody;
use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use crate::types::{BulkResult, DocumentResult};
use news_indexer_shared::IndexDocument;

/// Build the NDJSON body for a bulk upsert.
///
/// Every document becomes an `index` action with an explicit `_id`, which
/// replaces any existing document with that id instead of adding a copy.
pub fn build_bulk_body(index_name: &str, documents: &[IndexDocument]) -> Vec<JsonBody<Value>> {
    let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

    for doc in documents {
        body.push(json!({"index": {"_index": index_name, "_id": doc.id}}).into());
        body.push(Value::Object(doc.source.clone()).into());
    }

    body
}

/// Interpret a bulk response body.
///
/// Items are matched to documents by position, which is the order the
/// bulk API guarantees.
pub fn parse_bulk_response(
    documents: &[IndexDocument],
    response: &Value,
) -> Result<BulkResult, SearchIndexError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("bulk response has no items array"))?;

    if items.len() != documents.len() {
        return Err(SearchIndexError::parse(format!(
            "bulk response has {} items for {} documents",
            items.len(),
            documents.len()
        )));
    }

    let results = documents
        .iter()
        .zip(items)
        .map(|(doc, item)| parse_item(&doc.id, item))
        .collect();

    Ok(BulkResult::from_results(results))
}

fn parse_item(id: &str, item: &Value) -> DocumentResult {
    // Each item is an object keyed by its action name ("index").
    let Some(action) = item.as_object().and_then(|o| o.values().next()) else {
        return DocumentResult::failed(id, SearchIndexError::parse("malformed bulk item"));
    };

    let status = action
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(0);

    match action.get("error") {
        Some(error) => DocumentResult::failed(
            id,
            SearchIndexError::document_rejected(status, describe_error(error)),
        ),
        None if (200..300).contains(&status) => DocumentResult::succeeded(id),
        None => DocumentResult::failed(
            id,
            SearchIndexError::document_rejected(status, "unexpected item status"),
        ),
    }
}

fn describe_error(error: &Value) -> String {
    let kind = error.get("type").and_then(Value::as_str);
    let reason = error.get("reason").and_then(Value::as_str);

    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
        (Some(kind), None) => kind.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => error.to_string(),
    }
}
