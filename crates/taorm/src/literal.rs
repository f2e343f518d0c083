//! SQL literal formatting and bound parameters.
//!
//! Text is wrapped in single quotes without escaping embedded quotes. Callers
//! must not pass untrusted text through these paths.

use crate::value::Value;
use std::fmt;

/// Render a value as a SQL literal.
///
/// - textual values become `'text'`
/// - lists become `(a, 'b', ...)`, each element formatted recursively
/// - everything else uses its default scalar form
///
/// Returns `None` for an empty list, which has no literal form.
pub fn format_literal(value: &Value) -> Option<String> {
    match value {
        Value::List(items) if items.is_empty() => None,
        Value::List(items) => {
            let mut out = String::from("(");
            let mut first = true;
            for item in items {
                let Some(lit) = format_literal(item) else {
                    continue;
                };
                if !first {
                    out.push_str(", ");
                }
                out.push_str(&lit);
                first = false;
            }
            out.push(')');
            Some(out)
        }
        v if v.is_textual() => Some(quote(&v.to_string())),
        v => Some(v.to_string()),
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    out.push_str(text);
    out.push('\'');
    out
}

/// A positional parameter matched to one `?` in the assembled SQL.
///
/// `Literal` parameters were already rendered to SQL text and are substituted
/// verbatim by the driver; `Raw` parameters are bound natively.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Raw(Value),
    Literal(String),
}

impl Param {
    /// Bind a value the way conditions, tags and insert values do: lists
    /// expand to a literal list, text is quoted, anything else stays raw.
    ///
    /// Returns `None` for an empty list.
    pub fn bind(value: Value) -> Option<Self> {
        match &value {
            Value::List(_) => format_literal(&value).map(Param::Literal),
            v if v.is_textual() => format_literal(v).map(Param::Literal),
            _ => Some(Param::Raw(value)),
        }
    }

    /// SQL text used when the parameter is substituted inline.
    pub fn to_inline_sql(&self) -> String {
        match self {
            Param::Literal(s) => s.clone(),
            Param::Raw(v) => format_literal(v).unwrap_or_else(|| "NULL".to_string()),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Raw(value)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Literal(s) => f.write_str(s),
            Param::Raw(v) => write!(f, "{v}"),
        }
    }
}
