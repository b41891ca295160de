//! Documents written to the search index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A search index document keyed by the source record identifier.
///
/// Reusing the source identifier as the document `_id` makes every write an
/// overwrite, which is what keeps repeated bulk upserts idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub source: Map<String, Value>,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// An ordered group of documents handed to the bulk loader as one unit.
///
/// The size bound comes from the change reader's page size and is enforced
/// again by the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    documents: Vec<IndexDocument>,
}

impl Batch {
    pub fn new(documents: Vec<IndexDocument>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[IndexDocument] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<IndexDocument> {
        self.documents
    }
}

impl FromIterator<IndexDocument> for Batch {
    fn from_iter<I: IntoIterator<Item = IndexDocument>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
