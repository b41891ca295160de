//! Postgres-backed change source.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use tracing::{debug, info, instrument};

use crate::errors::SourceError;
use crate::interfaces::ChangeSource;
use crate::postgres::dsn::parse_dsn;
use crate::postgres::queries::{build_page_query, QueryParam, CHANGED_AT_ALIAS, ID_ALIAS};
use crate::postgres::table::SourceTable;
use crate::types::PageRequest;
use news_indexer_shared::{FieldValue, SourceRecord};

/// Connection settings for [`PostgresChangeSource`].
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// Bound on connection acquisition and on each statement.
    pub timeout: Duration,
    pub max_connections: u32,
    pub idle_timeout: Duration,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_connections: 2,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// Reads changed rows from one Postgres table.
///
/// Connections are opened on first use, so building the source never
/// touches the network.
pub struct PostgresChangeSource {
    pool: PgPool,
    table: SourceTable,
}

impl PostgresChangeSource {
    /// Build a lazily connecting source for `table`.
    ///
    /// Sessions run with `TimeZone=UTC` so naive timestamp columns are
    /// interpreted as UTC, and with a server-side `statement_timeout`
    /// matching `options.timeout`.
    pub fn connect_lazy(
        dsn: &str,
        table: SourceTable,
        options: PostgresOptions,
    ) -> Result<Self, SourceError> {
        let connect_options = parse_dsn(dsn)?.options([
            ("statement_timeout", options.timeout.as_millis().to_string()),
            ("TimeZone", "UTC".to_string()),
        ]);

        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.timeout)
            .idle_timeout(options.idle_timeout)
            .test_before_acquire(true)
            .connect_lazy_with(connect_options);

        info!(
            table = %table.table(),
            changed_at = %table.changed_at_column(),
            max_connections = options.max_connections,
            "Created Postgres change source"
        );

        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &SourceTable {
        &self.table
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ChangeSource for PostgresChangeSource {
    #[instrument(skip(self, request), fields(table = %self.table.table(), limit = request.limit))]
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<SourceRecord>, SourceError> {
        let (sql, params) = build_page_query(&self.table, request);

        let mut query = sqlx::query::<Postgres>(&sql);
        for param in params {
            query = match param {
                QueryParam::Timestamp(ts) => query.bind(ts),
                QueryParam::Text(text) => query.bind(text),
                QueryParam::BigInt(n) => query.bind(n),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "Fetched page");

        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &PgRow) -> Result<SourceRecord, SourceError> {
    let id: String = row.try_get(ID_ALIAS)?;
    let changed_at: DateTime<Utc> = row.try_get(CHANGED_AT_ALIAS)?;

    let mut record = SourceRecord::new(id, changed_at);
    for column in row.columns() {
        let name = column.name();
        if name == ID_ALIAS || name == CHANGED_AT_ALIAS {
            continue;
        }
        let value = decode_value(row, column.ordinal(), column.type_info().name())
            .map_err(|e| SourceError::decode(name, e.to_string()))?;
        record = record.with_field(name, value);
    }

    Ok(record)
}

fn decode_value(row: &PgRow, index: usize, type_name: &str) -> Result<FieldValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(FieldValue::Null);
    }

    let value = match type_name {
        "BOOL" => FieldValue::Bool(row.try_get(index)?),
        "INT2" => FieldValue::Integer(row.try_get::<i16, _>(index)?.into()),
        "INT4" => FieldValue::Integer(row.try_get::<i32, _>(index)?.into()),
        "INT8" => FieldValue::Integer(row.try_get(index)?),
        "FLOAT4" => FieldValue::Float(row.try_get::<f32, _>(index)?.into()),
        "FLOAT8" => FieldValue::Float(row.try_get(index)?),
        "TIMESTAMPTZ" => FieldValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?),
        "TIMESTAMP" => FieldValue::LocalTimestamp(row.try_get::<NaiveDateTime, _>(index)?),
        "DATE" => FieldValue::Date(row.try_get::<NaiveDate, _>(index)?),
        "JSON" | "JSONB" => FieldValue::Json(row.try_get::<serde_json::Value, _>(index)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => FieldValue::Text(row.try_get(index)?),
        other => {
            return Err(sqlx::Error::Decode(
                format!("unsupported column type {}", other).into(),
            ))
        }
    };

    Ok(value)
}
