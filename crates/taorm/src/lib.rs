//! # taorm
//!
//! A chainable statement builder and row materializer for TDengine-style SQL
//! engines.
//!
//! ## Features
//!
//! - **Fluent, isolated queries**: every context derived from the root handle
//!   owns its clause state; branch a query with `.clone()`
//! - **Bound conditions**: `?` templates with positional arguments, or
//!   `column = value` equality sets
//! - **Super-table inserts**: `INSERT INTO t USING st TAGS(...)` auto-creation
//! - **Generic materialization**: rows decode into any `serde` destination,
//!   a single record or a sequence
//! - **Sticky errors**: failures never panic; check the [`Outcome`]
//! - **SQL tracing**: executed SQL via `tracing` under the `taorm.sql` target
//!
//! ## Example
//!
//! ```ignore
//! use taorm::prelude::*;
//!
//! let db = Taos::new(SqliteSource::open_in_memory()?);
//!
//! db.table("d1001")
//!     .stable("meters", args!["California.SanFrancisco", 2])
//!     .insert(Record::new().set("ts", Utc::now()).set("current", 10.3))
//!     .into_result()?;
//!
//! let mut rows: Vec<Meter> = Vec::new();
//! db.table("meters")
//!     .filter("location = ? and groupid in ?", args!["California.SanFrancisco", vec![1, 2]])
//!     .order("ts desc")
//!     .limit(10)
//!     .page(1)
//!     .find(&mut rows)
//!     .into_result()?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod exec;
pub mod literal;
pub mod prelude;
pub mod query;
pub mod row;
pub mod statement;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use client::{Connection, ConnectionSource, MemoryRows, RowStream};
pub use condition::Condition;
pub use config::ClientConfig;
pub use error::{OrmError, OrmResult};
pub use exec::{count_placeholders, render_inline, validate_arity};
pub use literal::{Param, format_literal};
pub use query::{Outcome, Query, Taos};
pub use row::{Shape, materialize_rows, materialize_scalar, shape_of};
pub use statement::{Record, Statement};
pub use value::Value;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;
