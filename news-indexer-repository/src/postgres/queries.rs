//! SQL builder for page queries.

use chrono::{DateTime, Utc};

use crate::postgres::table::SourceTable;
use crate::types::{PageCursor, PageRequest};

/// Result column carrying the record identifier.
pub(crate) const ID_ALIAS: &str = "__record_id";

/// Result column carrying the change timestamp.
pub(crate) const CHANGED_AT_ALIAS: &str = "__changed_at";

/// A positional query parameter, bound in order as `$1..$n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Timestamp(DateTime<Utc>),
    Text(String),
    BigInt(i64),
}

/// Build the SQL and parameters for one page of changes.
///
/// Rows are ordered by `(changed_at, id::text COLLATE "C")`, which is total
/// because identifiers are unique, so both offset and keyset paging are
/// deterministic. Identifiers are ordered and compared bytewise so that the
/// keyset cursor taken from the last row of a page is exactly where the next
/// page starts, independent of the database collation.
pub fn build_page_query(table: &SourceTable, request: &PageRequest) -> (String, Vec<QueryParam>) {
    let id = format!("{}::text", table.id_column());
    let id_key = table.cursor_key_expression();
    let changed_at = table.changed_at_column();

    let mut sql = format!(
        "SELECT {id} AS {ID_ALIAS}, ({changed_at})::timestamptz AS {CHANGED_AT_ALIAS}"
    );
    for column in table.columns() {
        sql.push_str(", ");
        sql.push_str(column);
    }
    sql.push_str(" FROM ");
    sql.push_str(table.table());

    let mut params = Vec::new();
    let mut conditions = Vec::new();

    if let Some(watermark) = request.after {
        params.push(QueryParam::Timestamp(watermark.timestamp()));
        conditions.push(format!("{changed_at} > ${}", params.len()));
    }

    if let PageCursor::After(Some(key)) = &request.cursor {
        params.push(QueryParam::Timestamp(key.changed_at));
        let ts_param = params.len();
        params.push(QueryParam::Text(key.id.clone()));
        let id_param = params.len();
        conditions.push(format!("({changed_at}, {id_key}) > (${ts_param}, ${id_param})"));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(&format!(" ORDER BY {changed_at} ASC, {id_key} ASC"));

    params.push(QueryParam::BigInt(clamp_i64(request.limit as u64)));
    sql.push_str(&format!(" LIMIT ${}", params.len()));

    if let PageCursor::Offset(offset) = request.cursor {
        params.push(QueryParam::BigInt(clamp_i64(offset)));
        sql.push_str(&format!(" OFFSET ${}", params.len()));
    }

    (sql, params)
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use news_indexer_shared::{RecordKey, Watermark};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_full_sync_offset_query() {
        let table = SourceTable::articles();
        let (sql, params) = build_page_query(&table, &PageRequest::offset(None, 0, 1000));

        assert_eq!(
            sql,
            "SELECT id::text AS __record_id, (published_at)::timestamptz AS __changed_at, \
             title, content, author, published_at FROM articles \
             ORDER BY published_at ASC, id::text COLLATE \"C\" ASC LIMIT $1 OFFSET $2"
        );
        assert_eq!(params, vec![QueryParam::BigInt(1000), QueryParam::BigInt(0)]);
    }

    #[test]
    fn test_incremental_offset_query() {
        let table = SourceTable::articles();
        let after = Some(Watermark::new(ts(100)));
        let (sql, params) = build_page_query(&table, &PageRequest::offset(after, 2000, 1000));

        assert!(sql.contains("WHERE published_at > $1"));
        assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
        assert_eq!(
            params,
            vec![
                QueryParam::Timestamp(ts(100)),
                QueryParam::BigInt(1000),
                QueryParam::BigInt(2000)
            ]
        );
    }

    #[test]
    fn test_keyset_first_page_has_no_cursor_condition() {
        let table = SourceTable::articles();
        let (sql, params) = build_page_query(&table, &PageRequest::after_key(None, None, 50));

        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("OFFSET"));
        assert_eq!(params, vec![QueryParam::BigInt(50)]);
    }

    #[test]
    fn test_keyset_query_with_watermark_and_cursor() {
        let table = SourceTable::articles();
        let key = RecordKey {
            changed_at: ts(200),
            id: "42".to_string(),
        };
        let request = PageRequest::after_key(Some(Watermark::new(ts(100))), Some(key), 50);
        let (sql, params) = build_page_query(&table, &request);

        assert!(sql.contains(
            "WHERE published_at > $1 AND (published_at, id::text COLLATE \"C\") > ($2, $3)"
        ));
        assert!(sql.contains("ORDER BY published_at ASC, id::text COLLATE \"C\" ASC"));
        assert!(sql.ends_with("LIMIT $4"));
        assert_eq!(
            params,
            vec![
                QueryParam::Timestamp(ts(100)),
                QueryParam::Timestamp(ts(200)),
                QueryParam::Text("42".to_string()),
                QueryParam::BigInt(50)
            ]
        );
    }
}
