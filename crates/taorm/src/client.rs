//! Connection traits the statement layer runs against.
//!
//! A driver provides a [`ConnectionSource`] that checks out scoped
//! [`Connection`]s. Dropping the connection returns it, on every exit path.
//!
//! Parameters arrive as [`Param`]s positionally matched to `?` markers:
//! [`Param::Literal`] is substituted verbatim, [`Param::Raw`] is bound
//! natively (or substituted via [`Param::to_inline_sql`] for drivers without
//! native binding).

use crate::error::{OrmError, OrmResult};
use crate::literal::Param;
use crate::value::Value;

/// Hands out scoped connections. Shared by every query derived from a handle.
pub trait ConnectionSource: Send + Sync {
    /// Check out a connection. It is released when dropped.
    fn open(&self) -> OrmResult<Box<dyn Connection + '_>>;
}

/// A checked-out connection.
pub trait Connection {
    /// Run a statement and return the affected row count.
    fn execute(&mut self, sql: &str, params: &[Param]) -> OrmResult<u64>;

    /// Run a query and return its rows.
    fn query(&mut self, sql: &str, params: &[Param]) -> OrmResult<Box<dyn RowStream + '_>>;
}

/// A forward-only cursor over query results.
pub trait RowStream {
    /// Column names, in select order.
    fn column_names(&self) -> OrmResult<Vec<String>>;

    /// Advance to the next row. Returns `false` once exhausted.
    fn next(&mut self) -> OrmResult<bool>;

    /// Read the current row into `slots`, one slot per column.
    fn scan_into(&mut self, slots: &mut [Value]) -> OrmResult<()>;
}

/// A fully buffered [`RowStream`].
///
/// Drivers that cannot hand out a borrowing cursor collect rows into this.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    cursor: Option<usize>,
}

impl MemoryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowStream for MemoryRows {
    fn column_names(&self) -> OrmResult<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn next(&mut self) -> OrmResult<bool> {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn scan_into(&mut self, slots: &mut [Value]) -> OrmResult<()> {
        let row = self
            .cursor
            .and_then(|c| self.rows.get(c))
            .ok_or_else(|| OrmError::Query("scan called without a current row".to_string()))?;
        if slots.len() > row.len() {
            return Err(OrmError::Query(format!(
                "scan expected {} columns, row has {}",
                slots.len(),
                row.len()
            )));
        }
        for (slot, value) in slots.iter_mut().zip(row) {
            *slot = value.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_rows_iterate_once() {
        let mut rows = MemoryRows::new(
            vec!["id".into()],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );
        let mut slot = [Value::Null];
        let mut seen = Vec::new();
        while rows.next().unwrap() {
            rows.scan_into(&mut slot).unwrap();
            seen.push(slot[0].clone());
        }
        assert_eq!(seen, vec![Value::Int(1), Value::Int(2)]);
        assert!(!rows.next().unwrap());
    }

    #[test]
    fn scan_before_next_fails() {
        let mut rows = MemoryRows::new(vec!["id".into()], vec![vec![Value::Int(1)]]);
        let mut slot = [Value::Null];
        assert!(rows.scan_into(&mut slot).is_err());
    }

    #[test]
    fn scan_with_too_many_slots_fails() {
        let mut rows = MemoryRows::new(vec!["id".into()], vec![vec![Value::Int(1)]]);
        assert!(rows.next().unwrap());
        let mut slots = [Value::Null, Value::Null];
        assert!(rows.scan_into(&mut slots).is_err());
    }
}
