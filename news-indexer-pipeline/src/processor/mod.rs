//! Processor module for the news indexer pipeline.
//!
//! Transforms source records into search documents.

mod document_mapper;

pub use document_mapper::DocumentMapper;
