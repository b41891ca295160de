//! Interface definitions for the external stores.
//!
//! The sync pipeline only sees these traits, which keeps the concrete
//! backends swappable and lets tests substitute in-memory fakes.

mod change_source;
mod checkpoint_store;
mod search_index_provider;

pub use change_source::ChangeSource;
pub use checkpoint_store::CheckpointStore;
pub use search_index_provider::SearchIndexProvider;
