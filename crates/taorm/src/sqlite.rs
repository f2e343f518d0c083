//! Synchronous SQLite backend over `rusqlite`.
//!
//! SQLite understands `?` placeholders and the `limit <offset>, <count>` form,
//! so SELECT/COUNT/INSERT statements run unchanged. `USING ... TAGS(...)`
//! super-table inserts are TDengine syntax and are rejected by SQLite.
//!
//! [`Param::Literal`] parameters are spliced into the SQL text; [`Param::Raw`]
//! parameters are bound natively.

use crate::client::{Connection, ConnectionSource, MemoryRows, RowStream};
use crate::error::{OrmError, OrmResult};
use crate::literal::Param;
use crate::value::{Value, format_timestamp};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A single shared SQLite connection handed out one checkout at a time.
pub struct SqliteSource {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteSource {
    /// Open (or create) a database file.
    pub fn open_path(path: impl AsRef<Path>) -> OrmResult<Self> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ConnectionSource for SqliteSource {
    fn open(&self) -> OrmResult<Box<dyn Connection + '_>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| OrmError::Connection(format!("connection lock poisoned: {e}")))?;
        tracing::trace!(target: "taorm.sqlite", "connection checked out");
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection<'a> {
    conn: MutexGuard<'a, rusqlite::Connection>,
}

impl Drop for SqliteConnection<'_> {
    fn drop(&mut self) {
        tracing::trace!(target: "taorm.sqlite", "connection released");
    }
}

impl Connection for SqliteConnection<'_> {
    fn execute(&mut self, sql: &str, params: &[Param]) -> OrmResult<u64> {
        let (sql, values) = splice_literals(sql, params);
        let affected = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values.iter()))
            .map_err(|e| OrmError::Exec(e.to_string()))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Param]) -> OrmResult<Box<dyn RowStream + '_>> {
        let query_err = |e: rusqlite::Error| OrmError::Query(e.to_string());
        let (sql, values) = splice_literals(sql, params);

        let mut stmt = self.conn.prepare(&sql).map_err(query_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(values.iter()))
            .map_err(query_err)?;

        let mut buffered = Vec::new();
        while let Some(row) = rows.next().map_err(query_err)? {
            let mut record = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                record.push(read_value(column, row.get_ref(i).map_err(query_err)?)?);
            }
            buffered.push(record);
        }
        Ok(Box::new(MemoryRows::new(columns, buffered)))
    }
}

/// Replace each `?` whose parameter is a literal with the literal text and
/// collect the raw parameters left for native binding, in order.
fn splice_literals<'p>(sql: &str, params: &'p [Param]) -> (String, Vec<&'p Value>) {
    let mut out = String::with_capacity(sql.len());
    let mut raw = Vec::new();
    let mut params = params.iter();
    for ch in sql.chars() {
        if ch != '?' {
            out.push(ch);
            continue;
        }
        match params.next() {
            Some(Param::Literal(lit)) => out.push_str(lit),
            Some(Param::Raw(value)) => {
                out.push('?');
                raw.push(value);
            }
            None => out.push('?'),
        }
    }
    (out, raw)
}

/// Convert one cell. Text and blobs must be valid UTF-8; binary blobs have no
/// [`Value`] counterpart.
fn read_value(column: &str, value: ValueRef<'_>) -> OrmResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(e) => {
                return Err(OrmError::type_mismatch(
                    column,
                    format!("{} is not valid UTF-8: {e}", value.data_type()),
                ));
            }
        },
    })
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqlValue;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Timestamp(ts) => ToSqlOutput::Owned(SqlValue::Text(format_timestamp(ts))),
            Value::List(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(
                    "list values must be bound as literals".into(),
                ));
            }
        })
    }
}
