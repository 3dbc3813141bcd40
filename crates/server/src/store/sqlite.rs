use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use insight::{Body, DerivedMetadata, LogHeader, PreparedLog, Severity, StoredLog};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use tracing::{debug, info};

use super::{ExportRange, LogQuery, LogStore, StoreError, StoreResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS logs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        type        TEXT NOT NULL,
        title       TEXT NOT NULL,
        description TEXT NOT NULL,
        source      TEXT NOT NULL,
        color       TEXT NOT NULL,
        body        TEXT,
        timestamp   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_logs_type ON logs(type);
    CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
    CREATE INDEX IF NOT EXISTS idx_logs_color ON logs(color);
    CREATE INDEX IF NOT EXISTS idx_logs_source ON logs(source);
";

/// Added after the first schema; older databases get them on open.
const DERIVED_COLUMNS: [&str; 3] = ["derived_severity", "derived_source", "derived_category"];

const COLUMNS: &str = "id, type, title, description, source, color, body, timestamp, \
                       derived_severity, derived_source, derived_category";

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened SQLite log store at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn select(&self, sql: &str, args: Vec<SqlValue>) -> StoreResult<Vec<StoredLog>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), RawRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_log).collect()
    }
}

fn migrate(conn: &Connection) -> StoreResult<()> {
    let existing: Vec<String> = conn
        .prepare("SELECT name FROM pragma_table_info('logs')")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for column in DERIVED_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            debug!(column, "Adding derived column");
            conn.execute_batch(&format!("ALTER TABLE logs ADD COLUMN {} TEXT;", column))?;
        }
        conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS idx_logs_{0} ON logs({0});",
            column
        ))?;
    }
    Ok(())
}

/// Fixed-width so text comparison orders chronologically.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Also reads `YYYY-MM-DD HH:MM:SS`, SQLite's CURRENT_TIMESTAMP format.
fn decode_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| StoreError::Corrupt(format!("unreadable timestamp '{}'", raw)))
}

/// Make `%` and `_` in a search term literal (paired with `ESCAPE '\'`).
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

struct RawRow {
    id: i64,
    header: LogHeader,
    body: Option<String>,
    timestamp: String,
    derived_severity: Option<String>,
    derived_source: Option<String>,
    derived_category: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            header: LogHeader {
                log_type: row.get(1)?,
                title: row.get(2)?,
                description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                source: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                color: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            },
            body: row.get(6)?,
            timestamp: row.get(7)?,
            derived_severity: row.get(8)?,
            derived_source: row.get(9)?,
            derived_category: row.get(10)?,
        })
    }

    fn into_log(self) -> StoreResult<StoredLog> {
        let body: Body = match self.body.as_deref() {
            None | Some("") | Some("null") => Body::new(),
            Some(json) => serde_json::from_str(json)?,
        };

        let derived = match (self.derived_severity, self.derived_source, self.derived_category) {
            (Some(severity), Some(source), Some(category)) => {
                let severity = Severity::parse(&severity).ok_or_else(|| {
                    StoreError::Corrupt(format!("row {}: unknown severity '{}'", self.id, severity))
                })?;
                Some(DerivedMetadata {
                    severity,
                    source,
                    category,
                })
            }
            _ => None,
        };

        Ok(StoredLog {
            id: self.id,
            header: self.header,
            body,
            timestamp: decode_timestamp(&self.timestamp)?,
            derived,
        })
    }
}

impl LogStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn insert(&self, log: PreparedLog, timestamp: DateTime<Utc>) -> StoreResult<StoredLog> {
        let body = serde_json::to_string(&log.body)?;
        let id = {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT INTO logs (type, title, description, source, color, body, timestamp, \
                 derived_severity, derived_source, derived_category) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    log.header.log_type,
                    log.header.title,
                    log.header.description,
                    log.header.source,
                    log.header.color,
                    body,
                    encode_timestamp(timestamp),
                    log.derived.severity.as_str(),
                    log.derived.source,
                    log.derived.category,
                ],
            )?;
            conn.last_insert_rowid()
        };

        Ok(StoredLog {
            id,
            header: log.header,
            body: log.body,
            timestamp,
            derived: Some(log.derived),
        })
    }

    fn query(&self, query: &LogQuery) -> StoreResult<Vec<StoredLog>> {
        let mut sql = format!("SELECT {} FROM logs WHERE 1=1", COLUMNS);
        let mut args: Vec<SqlValue> = Vec::new();

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(search));
            sql.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' \
                 OR body LIKE ? ESCAPE '\\')",
            );
            args.extend(std::iter::repeat(SqlValue::Text(pattern)).take(3));
        }
        if let Some(log_type) = &query.log_type {
            sql.push_str(" AND type = ?");
            args.push(SqlValue::Text(log_type.clone()));
        }
        if let Some(color) = &query.color {
            sql.push_str(" AND color = ?");
            args.push(SqlValue::Text(color.clone()));
        }
        if let Some(severity) = query.severity {
            sql.push_str(" AND derived_severity = ?");
            args.push(SqlValue::Text(severity.as_str().to_string()));
        }
        if let Some(since) = query.since {
            sql.push_str(" AND timestamp >= ?");
            args.push(SqlValue::Text(encode_timestamp(since)));
        }
        if let Some(until) = query.until {
            sql.push_str(" AND timestamp <= ?");
            args.push(SqlValue::Text(encode_timestamp(until)));
        }

        sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?");
        args.push(SqlValue::Integer(query.limit as i64));
        args.push(SqlValue::Integer(query.offset as i64));

        self.select(&sql, args)
    }

    fn export(&self, range: &ExportRange) -> StoreResult<Vec<StoredLog>> {
        let mut sql = format!("SELECT {} FROM logs WHERE 1=1", COLUMNS);
        let mut args = Vec::new();

        if let Some(from) = range.from {
            sql.push_str(" AND timestamp >= ?");
            args.push(SqlValue::Text(encode_timestamp(from)));
        }
        if let Some(to) = range.to {
            sql.push_str(" AND timestamp <= ?");
            args.push(SqlValue::Text(encode_timestamp(to)));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC");

        self.select(&sql, args)
    }

    fn snapshot(&self) -> StoreResult<Vec<StoredLog>> {
        self.select(&format!("SELECT {} FROM logs", COLUMNS), Vec::new())
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM logs WHERE timestamp < ?1", params![encode_timestamp(cutoff)])?;
        Ok(deleted)
    }

    fn ping(&self) -> StoreResult<()> {
        self.conn.lock().query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn size_bytes(&self) -> StoreResult<Option<u64>> {
        let bytes: i64 = self.conn.lock().query_row(
            "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
            [],
            |row| row.get(0),
        )?;
        Ok(Some(bytes.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{at, exercise_literal_search, exercise_store};

    #[test]
    fn test_sqlite_store_contract() {
        exercise_store(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        exercise_literal_search(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_size_grows_with_data() {
        let store = SqliteStore::open_in_memory().unwrap();
        let empty = store.size_bytes().unwrap().unwrap();
        assert!(empty > 0);

        let body = serde_json::json!({ "blob": "x".repeat(64 * 1024) });
        store.insert(crate::store::tests::prepared("big", body), at(1, 0)).unwrap();
        assert!(store.size_bytes().unwrap().unwrap() > empty);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("90%_\\x"), "90\\%\\_\\\\x");
    }

    #[test]
    fn test_timestamps_are_fixed_width() {
        let a = encode_timestamp(at(1, 0));
        let b = encode_timestamp(at(1, 0) + chrono::Duration::microseconds(1));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert!(a.ends_with('Z'));
        assert_eq!(decode_timestamp(&a).unwrap(), at(1, 0));
    }

    #[test]
    fn test_reads_sqlite_default_timestamp_format() {
        assert_eq!(decode_timestamp("2026-03-01 00:00:00").unwrap(), at(1, 0));
        assert!(decode_timestamp("last tuesday").is_err());
    }

    #[test]
    fn test_legacy_database_is_migrated() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL, title TEXT NOT NULL, description TEXT NOT NULL,
                source TEXT NOT NULL, color TEXT NOT NULL, body TEXT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO logs (type, title, description, source, color, body, timestamp)
            VALUES ('info', 'old row', '', 'legacy', 'blue', '{\"k\":1}', '2026-03-01 00:00:00');",
        )
        .unwrap();

        let store = SqliteStore::with_connection(conn).unwrap();
        let logs = store.snapshot().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].header.title, "old row");
        assert_eq!(logs[0].body.get("k"), Some(&serde_json::json!(1)));
        assert!(logs[0].derived.is_none());
    }

    #[test]
    fn test_reopen_keeps_existing_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
    }
}
