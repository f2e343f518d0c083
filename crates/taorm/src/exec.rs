//! Arity validation, SQL logging and scoped execution.

use crate::client::{ConnectionSource, RowStream};
use crate::config::ClientConfig;
use crate::error::{OrmError, OrmResult};
use crate::literal::Param;
use tracing::Level;

/// Count `?` placeholder markers in `sql`.
///
/// Every `?` counts, including any inside quoted text.
pub fn count_placeholders(sql: &str) -> usize {
    sql.bytes().filter(|&b| b == b'?').count()
}

/// Fail with [`OrmError::ArityMismatch`] unless `sql` has exactly one `?` per parameter.
pub fn validate_arity(sql: &str, params: &[Param]) -> OrmResult<()> {
    let placeholders = count_placeholders(sql);
    if placeholders != params.len() {
        return Err(OrmError::arity(placeholders, params.len()));
    }
    Ok(())
}

/// Substitute each `?` with its parameter's inline SQL, left to right.
///
/// Used for human-readable tracing only; surplus placeholders stay as `?`.
pub fn render_inline(sql: &str, params: &[Param]) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut params = params.iter();
    for ch in sql.chars() {
        if ch == '?' {
            match params.next() {
                Some(p) => out.push_str(&p.to_inline_sql()),
                None => out.push('?'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn truncate_sql(config: &ClientConfig, sql: &str) -> String {
    match config.max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// The `sql` and optional `params` fields logged for a statement.
///
/// Default mode inlines each parameter into the SQL; `show_params` mode keeps
/// the raw SQL and renders the parameter list separately. SQL is truncated
/// per [`ClientConfig::max_sql_length`].
pub(crate) fn log_fields(
    config: &ClientConfig,
    sql: &str,
    params: &[Param],
) -> (String, Option<String>) {
    if config.show_params {
        (truncate_sql(config, sql), Some(format!("{params:?}")))
    } else {
        (truncate_sql(config, &render_inline(sql, params)), None)
    }
}

pub(crate) fn log_statement(config: &ClientConfig, sql: &str, params: &[Param]) {
    match log_fields(config, sql, params) {
        (sql, Some(params_field)) => emit_at_level!(
            config.log_level,
            target: "taorm.sql",
            param_count = params.len(),
            sql = %sql,
            params = %params_field,
        ),
        (sql, None) => emit_at_level!(
            config.log_level,
            target: "taorm.sql",
            param_count = params.len(),
            sql = %sql,
        ),
    }
}

/// Runs validated statements over scoped connections.
pub(crate) struct Executor<'a> {
    source: &'a dyn ConnectionSource,
    config: &'a ClientConfig,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(source: &'a dyn ConnectionSource, config: &'a ClientConfig) -> Self {
        Self { source, config }
    }

    /// Run a statement and return the affected row count.
    pub(crate) fn execute(&self, sql: &str, params: &[Param]) -> OrmResult<u64> {
        validate_arity(sql, params)?;
        log_statement(self.config, sql, params);
        let result = self
            .source
            .open()
            .and_then(|mut conn| conn.execute(sql, params));
        if let Err(err) = &result {
            tracing::warn!(target: "taorm.sql", error = %err, "statement failed");
        }
        result
    }

    /// Run a query and hand its rows to `read`.
    ///
    /// The connection is released once `read` returns.
    pub(crate) fn query<R>(
        &self,
        sql: &str,
        params: &[Param],
        read: impl FnOnce(&mut dyn RowStream) -> OrmResult<R>,
    ) -> OrmResult<R> {
        validate_arity(sql, params)?;
        log_statement(self.config, sql, params);
        let result = self.source.open().and_then(|mut conn| {
            let mut rows = conn.query(sql, params)?;
            read(rows.as_mut())
        });
        if let Err(err) = &result {
            tracing::warn!(target: "taorm.sql", error = %err, "query failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn counts_every_marker() {
        assert_eq!(count_placeholders("select * from t"), 0);
        assert_eq!(count_placeholders("a = ? and b in ?"), 2);
        assert_eq!(count_placeholders("name = '?'"), 1);
    }

    #[test]
    fn arity_must_match() {
        let p = vec![Param::Raw(Value::Int(1))];
        assert!(validate_arity("a = ?", &p).is_ok());
        assert_eq!(
            validate_arity("a = ? and b = ?", &p),
            Err(OrmError::arity(2, 1))
        );
        assert_eq!(validate_arity("select 1", &p), Err(OrmError::arity(0, 1)));
    }

    #[test]
    fn renders_params_inline() {
        let params = vec![
            Param::Raw(Value::Int(1)),
            Param::Literal("'x'".into()),
            Param::Literal("(1, 2)".into()),
        ];
        assert_eq!(
            render_inline("a = ? and b = ? and c in ?", &params),
            "a = 1 and b = 'x' and c in (1, 2)"
        );
    }

    #[test]
    fn render_keeps_surplus_placeholders() {
        assert_eq!(
            render_inline("a = ? and b = ?", &[Param::Raw(Value::Int(1))]),
            "a = 1 and b = ?"
        );
    }

    #[test]
    fn default_logging_inlines_params() {
        let config = ClientConfig::new();
        let params = vec![Param::Literal("'x'".into()), Param::Raw(Value::Int(2))];
        assert_eq!(
            log_fields(&config, "INSERT INTO t (a, b) VALUES (?, ?)", &params),
            ("INSERT INTO t (a, b) VALUES ('x', 2)".to_string(), None)
        );
    }

    #[test]
    fn show_params_logs_raw_sql_and_param_list() {
        let config = ClientConfig::new().show_params(true);
        let params = vec![Param::Literal("'x'".into()), Param::Raw(Value::Int(2))];
        let (sql, listed) = log_fields(&config, "INSERT INTO t (a, b) VALUES (?, ?)", &params);
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (?, ?)");
        assert_eq!(listed, Some(format!("{params:?}")));
    }

    #[test]
    fn logged_sql_is_truncated() {
        let params = vec![Param::Literal("'abcdef'".into())];
        let config = ClientConfig::new().max_sql_length(12);
        assert_eq!(
            log_fields(&config, "select ? from t", &params).0,
            "select 'abcd..."
        );

        let config = ClientConfig::new().max_sql_length(4).no_truncate();
        assert_eq!(
            log_fields(&config, "select ? from t", &params).0,
            "select 'abcdef' from t"
        );

        let config = ClientConfig::new().show_params(true).max_sql_length(6);
        assert_eq!(log_fields(&config, "select ? from t", &params).0, "select...");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("abc", 10), "abc");
        assert_eq!(truncate_sql_bytes("héllo", 2), "h");
    }
}
