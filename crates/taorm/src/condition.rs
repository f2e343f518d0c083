//! WHERE condition inputs.
//!
//! A [`Condition`] is either a SQL template with `?` placeholders and positional
//! arguments, or a set of `column = value` equalities. Appending a condition to
//! a [`Statement`] resolves it into one where-fragment plus its bound
//! parameters.

use crate::error::{OrmError, OrmResult};
use crate::exec::count_placeholders;
use crate::literal::{Param, format_literal};
use crate::statement::Statement;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// A condition accepted by [`Query::filter_cond`](crate::Query::filter_cond).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// SQL text with `?` placeholders. Without placeholders and arguments it is
    /// a raw boolean fragment.
    Template { sql: String, args: Vec<Value> },
    /// `AND`-joined `column = value` equalities, in the given order.
    Equals(Vec<(String, Value)>),
}

impl Condition {
    /// A raw boolean fragment with no parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Template {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// A placeholder template with positional arguments.
    pub fn template(sql: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Condition::Template {
            sql: sql.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Equalities over `(column, value)` pairs.
    pub fn equals<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Equals(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Resolve this condition into `stmt`'s where-fragments and parameters.
    ///
    /// Conditions that resolve to nothing (empty text, numeric-looking text,
    /// empty equality sets, empty list arguments) leave `stmt` unchanged and
    /// return `Ok`. A placeholder/argument count mismatch also leaves `stmt`
    /// unchanged and returns [`OrmError::ArityMismatch`]; the caller decides
    /// whether that is fatal.
    pub fn append_to(self, stmt: &mut Statement) -> OrmResult<()> {
        match self {
            Condition::Template { sql, args } => append_template(stmt, sql, args),
            Condition::Equals(pairs) => {
                append_equals(stmt, pairs);
                Ok(())
            }
        }
    }
}

fn append_template(stmt: &mut Statement, sql: String, args: Vec<Value>) -> OrmResult<()> {
    // Integer-looking text is never a condition.
    if sql.is_empty() || sql.parse::<i64>().is_ok() {
        return Ok(());
    }

    let placeholders = count_placeholders(&sql);
    if placeholders != args.len() {
        return Err(OrmError::arity(placeholders, args.len()));
    }

    let mut params = Vec::with_capacity(args.len());
    for arg in args {
        match Param::bind(arg) {
            Some(p) => params.push(p),
            None => return Ok(()),
        }
    }

    stmt.wheres.push(sql);
    stmt.params.extend(params);
    Ok(())
}

fn append_equals(stmt: &mut Statement, pairs: Vec<(String, Value)>) {
    let mut fragment = String::new();
    for (column, value) in pairs {
        let Some(lit) = format_literal(&value) else {
            continue;
        };
        if !fragment.is_empty() {
            fragment.push_str(" and ");
        }
        fragment.push_str(&column);
        fragment.push_str(" = ");
        fragment.push_str(&lit);
    }
    if !fragment.is_empty() {
        stmt.wheres.push(fragment);
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::raw(sql)
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::raw(sql)
    }
}

impl<S: Into<String>> From<(S, Vec<Value>)> for Condition {
    fn from((sql, args): (S, Vec<Value>)) -> Self {
        Condition::template(sql, args)
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Condition {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Condition::equals(pairs)
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Condition {
    fn from(map: BTreeMap<K, V>) -> Self {
        Condition::equals(map)
    }
}

/// Iteration order of a `HashMap` is unspecified, so the sub-clause order of
/// the resulting fragment is too.
impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Condition {
    fn from(map: HashMap<K, V>) -> Self {
        Condition::equals(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn apply(cond: impl Into<Condition>) -> (Statement, OrmResult<()>) {
        let mut stmt = Statement::new();
        let res = cond.into().append_to(&mut stmt);
        (stmt, res)
    }

    #[test]
    fn template_binds_and_quotes_text() {
        let (stmt, res) = apply(("a = ? and b = ?", args![1, "x"]));
        assert!(res.is_ok());
        assert_eq!(stmt.wheres, vec!["a = ? and b = ?".to_string()]);
        assert_eq!(
            stmt.params,
            vec![Param::Raw(Value::Int(1)), Param::Literal("'x'".into())]
        );
    }

    #[test]
    fn template_expands_lists() {
        let (stmt, _) = apply(("groupid in ?", args![vec![1, 2, 3]]));
        assert_eq!(stmt.params, vec![Param::Literal("(1, 2, 3)".into())]);
    }

    #[test]
    fn arity_mismatch_changes_nothing() {
        let (stmt, res) = apply(("a = ? and b = ?", args![1]));
        assert_eq!(res, Err(OrmError::arity(2, 1)));
        assert!(stmt.wheres.is_empty());
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn raw_fragment_is_appended() {
        let (stmt, res) = apply("current > 10");
        assert!(res.is_ok());
        assert_eq!(stmt.wheres, vec!["current > 10".to_string()]);
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn empty_and_numeric_text_are_ignored() {
        for sql in ["", "1", "-42", "+7"] {
            let (stmt, res) = apply(sql);
            assert!(res.is_ok());
            assert!(stmt.wheres.is_empty(), "{sql:?} should be ignored");
        }
    }

    #[test]
    fn numeric_text_with_args_is_ignored() {
        let (stmt, res) = apply(("5", args![1]));
        assert!(res.is_ok());
        assert!(stmt.wheres.is_empty());
    }

    #[test]
    fn empty_list_argument_drops_condition() {
        let (stmt, res) = apply(("id in ?", args![Vec::<i32>::new()]));
        assert!(res.is_ok());
        assert!(stmt.wheres.is_empty());
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn equalities_join_with_and() {
        let (stmt, _) = apply(vec![("a", Value::from(1)), ("b", Value::from("x"))]);
        assert_eq!(stmt.wheres, vec!["a = 1 and b = 'x'".to_string()]);
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn hash_map_equalities_contain_each_clause() {
        let mut m = HashMap::new();
        m.insert("a", Value::from(1));
        m.insert("b", Value::from("x"));
        let (stmt, _) = apply(m);
        assert_eq!(stmt.wheres.len(), 1);
        let frag = &stmt.wheres[0];
        assert!(frag.contains("a = 1"));
        assert!(frag.contains("b = 'x'"));
        assert!(!frag.ends_with(" and "));
        assert_eq!(frag.matches(" and ").count(), 1);
    }

    #[test]
    fn empty_equalities_are_noop() {
        let (stmt, _) = apply(Vec::<(String, Value)>::new());
        assert!(stmt.wheres.is_empty());
    }
}
