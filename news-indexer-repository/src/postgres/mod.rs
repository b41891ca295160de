//! Postgres implementation of the change source.

mod change_source;
mod dsn;
mod queries;
mod table;

pub use change_source::{PostgresChangeSource, PostgresOptions};
pub use dsn::parse_dsn;
pub use queries::{build_page_query, QueryParam};
pub use table::SourceTable;
