//! The root handle and the chainable query context.
//!
//! [`Taos`] is the long-lived handle holding the connection source and config.
//! Every call on it starts a fresh [`Query`] with empty clause state. A
//! `Query` is a by-value accumulator: chaining consumes it and returns it with
//! one more clause, and branching a partially built query is an explicit
//! `.clone()`, so two branches never see each other's later clauses.
//!
//! Terminal calls (`find`, `take`, `count`, `insert`, `exec`) consume the query
//! and return an [`Outcome`]. Failures at any stage never panic or unwind; they
//! are recorded as a sticky error that later chained calls carry forward and
//! terminal calls report without touching the connection.
//!
//! ```ignore
//! let db = Taos::new(source);
//! let base = db.table("meters").filter("location = ?", args!["California.SF"]);
//!
//! let mut total = 0;
//! base.clone().count(&mut total).into_result()?;
//!
//! let mut rows: Vec<Meter> = Vec::new();
//! base.order("ts desc").limit(20).page(1).find(&mut rows).into_result()?;
//! ```

use crate::client::ConnectionSource;
use crate::condition::Condition;
use crate::config::ClientConfig;
use crate::error::{OrmError, OrmResult};
use crate::exec::Executor;
use crate::literal::Param;
use crate::row::{materialize_rows, materialize_scalar};
use crate::statement::{Record, Statement};
use crate::value::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// The root handle. Cheap to clone; clones share the connection source.
#[derive(Clone)]
pub struct Taos {
    source: Arc<dyn ConnectionSource>,
    config: Arc<ClientConfig>,
}

impl Taos {
    /// Create a handle over a connection source with the default config.
    pub fn new(source: impl ConnectionSource + 'static) -> Self {
        Self::from_source(Arc::new(source))
    }

    /// Create a handle over an already shared connection source.
    pub fn from_source(source: Arc<dyn ConnectionSource>) -> Self {
        Self {
            source,
            config: Arc::new(ClientConfig::default()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start an empty query.
    pub fn query(&self) -> Query {
        Query {
            db: self.clone(),
            stmt: Statement::new(),
            error: None,
        }
    }

    pub fn table(&self, table: impl Into<String>) -> Query {
        self.query().table(table)
    }

    pub fn stable(&self, stable: impl Into<String>, tags: impl IntoIterator<Item = Value>) -> Query {
        self.query().stable(stable, tags)
    }

    pub fn filter(&self, sql: &str, args: impl IntoIterator<Item = Value>) -> Query {
        self.query().filter(sql, args)
    }

    pub fn filter_eq<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Query
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.query().filter_eq(pairs)
    }

    pub fn filter_cond(&self, cond: impl Into<Condition>) -> Query {
        self.query().filter_cond(cond)
    }

    pub fn group(&self, group: impl Into<String>) -> Query {
        self.query().group(group)
    }

    pub fn order(&self, order: impl Into<String>) -> Query {
        self.query().order(order)
    }

    pub fn limit(&self, limit: i64) -> Query {
        self.query().limit(limit)
    }

    pub fn page(&self, page: i64) -> Query {
        self.query().page(page)
    }

    pub fn field(&self, field: impl Into<String>) -> Query {
        self.query().field(field)
    }

    /// Run caller-written SQL with raw positional parameters.
    pub fn exec(&self, sql: &str, args: impl IntoIterator<Item = Value>) -> Outcome {
        self.query().exec(sql, args)
    }
}

impl fmt::Debug for Taos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taos")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A query under construction.
#[derive(Clone)]
#[must_use = "a query does nothing until a terminal call such as `find` or `insert`"]
pub struct Query {
    db: Taos,
    stmt: Statement,
    error: Option<OrmError>,
}

impl Query {
    // ==================== Clauses ====================

    /// Set the target table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.stmt.table = table.into();
        self
    }

    /// Insert through a super table, creating the target table from it with
    /// these tag values if needed. Replaces any previous super table and tags.
    pub fn stable(mut self, stable: impl Into<String>, tags: impl IntoIterator<Item = Value>) -> Self {
        self.stmt.stable = Some(stable.into());
        self.stmt.tags = tags.into_iter().collect();
        self
    }

    /// Add a WHERE condition with `?` placeholders.
    ///
    /// Text arguments are quoted, list arguments expanded to `(a, b, ...)`.
    /// Without placeholders and arguments `sql` is appended as a raw fragment.
    /// Empty and integer-looking text is ignored. A placeholder/argument
    /// mismatch drops the condition, or fails the query under
    /// [`ClientConfig::strict_conditions`].
    pub fn filter(self, sql: &str, args: impl IntoIterator<Item = Value>) -> Self {
        self.filter_cond(Condition::template(sql, args))
    }

    /// Add `column = value` equalities joined by `and`, as one condition.
    pub fn filter_eq<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter_cond(Condition::equals(pairs))
    }

    /// Add a prebuilt [`Condition`].
    pub fn filter_cond(mut self, cond: impl Into<Condition>) -> Self {
        if let Err(err) = cond.into().append_to(&mut self.stmt) {
            if self.db.config.strict_conditions {
                self.fail(err);
            } else {
                tracing::debug!(target: "taorm", error = %err, "condition dropped");
            }
        }
        self
    }

    /// Set the GROUP BY body.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.stmt.group = group.into();
        self
    }

    /// Set the ORDER BY body.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.stmt.order = order.into();
        self
    }

    /// Set the page size. Negative values become 0 (no pagination).
    pub fn limit(mut self, limit: i64) -> Self {
        self.stmt.limit = limit.max(0);
        self
    }

    /// Set the 1-based page number. Values below 1 become 1.
    pub fn page(mut self, page: i64) -> Self {
        self.stmt.page = page.max(1);
        self
    }

    /// Append a projection expression.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.stmt.selects.push(field.into());
        self
    }

    /// Bind one extra positional parameter, for a `?` written into a
    /// projection or table expression. Bound like a condition argument.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        if let Some(p) = Param::bind(value.into()) {
            self.stmt.params.push(p);
        }
        self
    }

    // ==================== Inspection ====================

    pub fn statement(&self) -> &Statement {
        &self.stmt
    }

    /// The sticky error, if any stage has failed so far.
    pub fn error(&self) -> Option<&OrmError> {
        self.error.as_ref()
    }

    /// SQL that [`Query::find`] would run.
    pub fn to_select_sql(&self) -> OrmResult<String> {
        self.stmt.build_select()
    }

    /// SQL that [`Query::count`] would run.
    pub fn to_count_sql(&self) -> OrmResult<String> {
        self.stmt.build_count()
    }

    fn fail(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    // ==================== Terminal calls ====================

    /// Select into `dest`.
    ///
    /// A sequence destination (`Vec<T>`, ...) receives every row; any other
    /// destination receives the last row. See [`crate::row`].
    pub fn find<T: DeserializeOwned>(self, dest: &mut T) -> Outcome {
        self.finish(|q| {
            let sql = q.stmt.build_select()?;
            q.executor().query(&sql, &q.stmt.params, |rows| materialize_rows(rows, dest))?;
            Ok(0)
        })
    }

    /// Select the first page of one row into `dest`.
    pub fn take<T: DeserializeOwned>(mut self, dest: &mut T) -> Outcome {
        self.stmt.page = 1;
        self.stmt.limit = 1;
        self.find(dest)
    }

    /// Count matching rows into `total`.
    pub fn count(self, total: &mut i64) -> Outcome {
        self.finish(|q| {
            let sql = q.stmt.build_count()?;
            q.executor().query(&sql, &q.stmt.params, |rows| materialize_scalar(rows, total))?;
            Ok(0)
        })
    }

    /// Insert one row. Column order follows the record.
    pub fn insert(self, record: impl Into<Record>) -> Outcome {
        let record = record.into();
        self.finish(|q| {
            let (sql, params) = q.stmt.build_insert(&record)?;
            q.executor().execute(&sql, &params)
        })
    }

    /// Insert a serializable struct or map; columns are its field names.
    pub fn insert_entity<T: Serialize + ?Sized>(mut self, entity: &T) -> Outcome {
        match Record::from_serialize(entity) {
            Ok(record) => self.insert(record),
            Err(err) => {
                self.fail(err);
                self.finish(|_| Ok(0))
            }
        }
    }

    /// Run caller-written SQL with raw positional parameters, ignoring the
    /// accumulated clauses.
    pub fn exec(self, sql: &str, args: impl IntoIterator<Item = Value>) -> Outcome {
        let params: Vec<Param> = args.into_iter().map(Param::Raw).collect();
        self.finish(|q| q.executor().execute(sql, &params))
    }

    fn executor(&self) -> Executor<'_> {
        Executor::new(self.db.source.as_ref(), &self.db.config)
    }

    fn finish(self, run: impl FnOnce(&Query) -> OrmResult<u64>) -> Outcome {
        if let Some(err) = &self.error {
            return Outcome::failed(err.clone());
        }
        match run(&self) {
            Ok(affected_rows) => Outcome {
                affected_rows,
                error: None,
            },
            Err(err) => Outcome::failed(err),
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("stmt", &self.stmt)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// The result of a terminal call.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "check `error()` or call `into_result()`"]
pub struct Outcome {
    affected_rows: u64,
    error: Option<OrmError>,
}

impl Outcome {
    fn failed(err: OrmError) -> Self {
        Self {
            affected_rows: 0,
            error: Some(err),
        }
    }

    pub fn error(&self) -> Option<&OrmError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Rows affected by `insert`/`exec`; 0 for reads and failures.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn into_result(self) -> OrmResult<u64> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.affected_rows),
        }
    }
}
