//! Accumulated clause state and SQL assembly for SELECT, COUNT and INSERT.

use crate::error::{OrmError, OrmResult};
use crate::literal::Param;
use crate::value::Value;

/// Clause state for one statement.
///
/// A `Statement` belongs to exactly one [`Query`](crate::Query); branching a
/// query clones it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub(crate) table: String,
    pub(crate) stable: Option<String>,
    pub(crate) tags: Vec<Value>,
    pub(crate) wheres: Vec<String>,
    pub(crate) selects: Vec<String>,
    pub(crate) group: String,
    pub(crate) order: String,
    pub(crate) limit: i64,
    pub(crate) page: i64,
    pub(crate) params: Vec<Param>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn stable(&self) -> Option<&str> {
        self.stable.as_deref()
    }

    pub fn tags(&self) -> &[Value] {
        &self.tags
    }

    /// Resolved where-fragments, in the order they were added.
    pub fn where_fragments(&self) -> &[String] {
        &self.wheres
    }

    pub fn selects(&self) -> &[String] {
        &self.selects
    }

    /// Bound parameters, in the order they were added.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Build the SELECT statement.
    ///
    /// Clause order is where, order by, group by, limit. Pagination is only
    /// emitted when both `limit` and `page` are positive, as
    /// `limit <offset>, <limit>` with no trailing whitespace. An offset that
    /// does not fit in `i64` is a validation error.
    pub fn build_select(&self) -> OrmResult<String> {
        let mut sql = self.select_head("*")?;
        if !self.order.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.order);
        }
        if !self.group.is_empty() {
            sql.push_str(" group by ");
            sql.push_str(&self.group);
        }
        if self.limit > 0 && self.page > 0 {
            let offset = (self.page - 1)
                .checked_mul(self.limit)
                .ok_or_else(|| OrmError::validation("pagination offset overflows"))?;
            sql.push_str(&format!(" limit {}, {}", offset, self.limit));
        }
        Ok(sql)
    }

    /// Build the COUNT statement: the SELECT shape without order/group/limit.
    pub fn build_count(&self) -> OrmResult<String> {
        self.select_head("count(1) as total")
    }

    fn select_head(&self, default_projection: &str) -> OrmResult<String> {
        if self.table.is_empty() {
            return Err(OrmError::MissingTable);
        }
        let mut sql = String::from("select ");
        if self.selects.is_empty() {
            sql.push_str(default_projection);
        } else {
            sql.push_str(&self.selects.join(", "));
        }
        sql.push_str(" from ");
        sql.push_str(&self.table);
        self.push_where(&mut sql);
        Ok(sql)
    }

    fn push_where(&self, sql: &mut String) {
        for (i, fragment) in self.wheres.iter().enumerate() {
            sql.push_str(if i == 0 { " where (" } else { " and (" });
            sql.push_str(fragment);
            sql.push(')');
        }
    }

    /// Build the INSERT statement for `record`.
    ///
    /// Returns the SQL and the full parameter list: already-bound parameters,
    /// then tag values, then column values. With a super table set, the target
    /// table is created on first insert from that template.
    pub fn build_insert(&self, record: &Record) -> OrmResult<(String, Vec<Param>)> {
        if self.table.is_empty() {
            return Err(OrmError::MissingTable);
        }
        if record.is_empty() {
            return Err(OrmError::validation("insert requires at least one column"));
        }

        let mut params = self.params.clone();
        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.table);

        if let Some(stable) = &self.stable {
            if self.tags.is_empty() {
                return Err(OrmError::MissingTags(stable.clone()));
            }
            sql.push_str(" USING ");
            sql.push_str(stable);
            sql.push_str(" TAGS(");
            sql.push_str(&placeholders(self.tags.len()));
            sql.push(')');
            for tag in &self.tags {
                params.push(bind_column("tag", tag.clone())?);
            }
        }

        let columns: Vec<&str> = record.columns().collect();
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push_str(") VALUES (");
        sql.push_str(&placeholders(columns.len()));
        sql.push(')');
        for (column, value) in record.iter() {
            params.push(bind_column(column, value.clone())?);
        }

        Ok((sql, params))
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn bind_column(column: &str, value: Value) -> OrmResult<Param> {
    Param::bind(value)
        .ok_or_else(|| OrmError::validation(format!("empty list for column '{column}'")))
}

/// An ordered column/value row for INSERT.
///
/// Column order is insertion order, so the generated SQL is deterministic.
///
/// ```ignore
/// let row = Record::new()
///     .set("ts", Utc::now())
///     .set("current", 10.3)
///     .set("phase", 0.31);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting an existing column replaces its value in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Build a record from a serializable struct or map.
    ///
    /// The value must serialize to an object; columns come out sorted by name.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> OrmResult<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect()),
            other => Err(OrmError::Encoding(format!(
                "expected an object to insert, got {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Record {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}
