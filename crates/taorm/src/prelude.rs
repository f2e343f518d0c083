//! Convenient imports for typical `taorm` usage.
//!
//! ```ignore
//! use taorm::prelude::*;
//! ```

pub use crate::args;
pub use crate::{ClientConfig, Condition, OrmError, OrmResult, Outcome, Query, Record, Taos, Value};

#[cfg(feature = "sqlite")]
pub use crate::SqliteSource;
