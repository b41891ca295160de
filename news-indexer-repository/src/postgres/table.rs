//! Description of the source table.

use crate::errors::SourceError;

/// Which table and columns the change source reads.
///
/// Names are interpolated into SQL, so they are validated as plain
/// (optionally schema-qualified) identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    table: String,
    id_column: String,
    changed_at_column: String,
    columns: Vec<String>,
}

impl SourceTable {
    /// Describe a source table.
    ///
    /// # Arguments
    ///
    /// * `table` - Table name, e.g. `articles` or `public.articles`
    /// * `id_column` - Unique identifier column, read as text
    /// * `changed_at_column` - Change timestamp column driving extraction
    /// * `columns` - Columns copied into each record's fields
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        changed_at_column: impl Into<String>,
        columns: Vec<String>,
    ) -> Result<Self, SourceError> {
        let table = table.into();
        let id_column = id_column.into();
        let changed_at_column = changed_at_column.into();

        validate_identifier(&table)?;
        validate_identifier(&id_column)?;
        validate_identifier(&changed_at_column)?;
        for column in &columns {
            validate_identifier(column)?;
        }

        Ok(Self {
            table,
            id_column,
            changed_at_column,
            columns,
        })
    }

    /// The `articles` table of the news service.
    pub fn articles() -> Self {
        Self {
            table: "articles".to_string(),
            id_column: "id".to_string(),
            changed_at_column: "published_at".to_string(),
            columns: ["title", "content", "author", "published_at"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn changed_at_column(&self) -> &str {
        &self.changed_at_column
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Identifier as ordered and compared by keyset paging.
    ///
    /// The `"C"` collation orders by bytes, the same order [`RecordKey`]
    /// uses, whatever the database default collation is.
    ///
    /// [`RecordKey`]: news_indexer_shared::RecordKey
    pub fn cursor_key_expression(&self) -> String {
        format!("{}::text COLLATE \"C\"", self.id_column)
    }

    /// DDL for the index backing page queries.
    ///
    /// Page queries order by an expression over the identifier, so a plain
    /// primary key index cannot serve them.
    pub fn cursor_index_ddl(&self) -> String {
        let relation = self.table.rsplit('.').next().unwrap_or(&self.table);
        format!(
            "CREATE INDEX IF NOT EXISTS {relation}_sync_cursor_idx ON {} ({}, ({}))",
            self.table,
            self.changed_at_column,
            self.cursor_key_expression()
        )
    }
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::articles()
    }
}

fn validate_identifier(name: &str) -> Result<(), SourceError> {
    let valid = !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(SourceError::configuration(format!(
            "Invalid SQL identifier: {:?}",
            name
        )))
    }
}
