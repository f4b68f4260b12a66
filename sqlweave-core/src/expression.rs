//! Composable condition expressions
//!
//! Every expression renders to a SQL fragment through a [`Dialect`] and
//! appends its bound values to a shared [`Params`] set. Generated values are
//! referenced from the fragment as `{:pN}` placeholders, which the query
//! layer later rewrites into the dialect's own placeholder syntax.
//!
//! # Examples
//!
//! ```
//! use sqlweave_core::{Expr, Params, dialect::Standard};
//!
//! let cond = Expr::and([
//!     Expr::hash([("status", 1)]),
//!     Expr::between("age", 18, 30),
//! ]);
//! let mut params = Params::new();
//! let sql = cond.build(&Standard, &mut params);
//! assert_eq!(sql, r#"("status"={:p0}) AND ("age" BETWEEN {:p1} AND {:p2})"#);
//! ```

use crate::dialect::Dialect;
use crate::{Params, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A node that can render itself into a SQL fragment
pub trait Expression: fmt::Debug + Send + Sync {
    /// Render the fragment, appending any bound values to `params`
    fn build(&self, dialect: &dyn Dialect, params: &mut Params) -> String;
}

/// A bound value or an inline expression
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Value),
    Expr(Expr),
}

impl Operand {
    /// Render as a placeholder for a value, or inline for an expression
    pub(crate) fn render(&self, dialect: &dyn Dialect, params: &mut Params) -> String {
        match self {
            Operand::Value(v) => {
                let name = params.push_auto(v.clone());
                format!("{{:{}}}", name)
            }
            Operand::Expr(e) => e.build(dialect, params),
        }
    }
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<LikeExp> for Operand {
    fn from(e: LikeExp) -> Self {
        Operand::Expr(Expr::Like(e))
    }
}

macro_rules! operand_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(v.into())
                }
            }
        )*
    };
}

operand_from_value!(Value, (), bool, i32, i64, u32, f32, f64, String, &str, &String, serde_json::Value);

#[cfg(feature = "uuid-support")]
operand_from_value!(uuid::Uuid);
#[cfg(feature = "datetime-support")]
operand_from_value!(chrono::DateTime<chrono::Utc>);
#[cfg(feature = "decimal-support")]
operand_from_value!(rust_decimal::Decimal);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::Value(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(v.into())
    }
}

/// The built-in expression variants
#[derive(Debug, Clone)]
pub enum Expr {
    /// A verbatim fragment with its own bindings
    Raw { sql: String, params: Params },
    /// Column equality map, rendered in key order and joined with AND
    Hash(BTreeMap<String, Operand>),
    Not(Box<Expr>),
    AndOr { op: &'static str, exprs: Vec<Expr> },
    In {
        column: String,
        values: Vec<Operand>,
        not: bool,
    },
    Like(LikeExp),
    Exists { expr: Box<Expr>, not: bool },
    Between {
        column: String,
        from: Value,
        to: Value,
        not: bool,
    },
    Custom(Arc<dyn Expression>),
}

impl Expr {
    /// A raw SQL fragment
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    /// A raw SQL fragment whose `{:name}` placeholders are bound by `params`
    pub fn raw_with(sql: impl Into<String>, params: Params) -> Self {
        Expr::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Column equality map.
    ///
    /// A `Null` value renders `col IS NULL`, an array renders as `IN`, and a
    /// nested expression is wrapped in parentheses.
    pub fn hash<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Expr::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn not(expr: impl Into<Expr>) -> Self {
        Expr::Not(Box::new(expr.into()))
    }

    /// Join expressions with AND. `None` entries are skipped.
    pub fn and<I>(exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Expr>>,
    {
        Self::and_or("AND", exprs)
    }

    /// Join expressions with OR. `None` entries are skipped.
    pub fn or<I>(exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Expr>>,
    {
        Self::and_or("OR", exprs)
    }

    fn and_or<I>(op: &'static str, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Expr>>,
    {
        Expr::AndOr {
            op,
            exprs: exprs.into_iter().filter_map(Into::into).collect(),
        }
    }

    /// `column IN (...)`
    pub fn is_in<I>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        Expr::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            not: false,
        }
    }

    /// `column NOT IN (...)`
    pub fn not_in<I>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        Expr::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            not: true,
        }
    }

    /// `column LIKE ...` for each value, joined with AND
    pub fn like<I, S>(column: impl Into<String>, values: I) -> LikeExp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LikeExp::new(column, values, "LIKE", false)
    }

    pub fn not_like<I, S>(column: impl Into<String>, values: I) -> LikeExp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LikeExp::new(column, values, "NOT LIKE", false)
    }

    /// `column LIKE ...` for each value, joined with OR
    pub fn or_like<I, S>(column: impl Into<String>, values: I) -> LikeExp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LikeExp::new(column, values, "LIKE", true)
    }

    pub fn or_not_like<I, S>(column: impl Into<String>, values: I) -> LikeExp
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LikeExp::new(column, values, "NOT LIKE", true)
    }

    pub fn exists(expr: impl Into<Expr>) -> Self {
        Expr::Exists {
            expr: Box::new(expr.into()),
            not: false,
        }
    }

    pub fn not_exists(expr: impl Into<Expr>) -> Self {
        Expr::Exists {
            expr: Box::new(expr.into()),
            not: true,
        }
    }

    pub fn between(column: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            not: false,
        }
    }

    pub fn not_between(
        column: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            not: true,
        }
    }

    /// Wrap a user-defined expression node
    pub fn custom(expr: impl Expression + 'static) -> Self {
        Expr::Custom(Arc::new(expr))
    }

    /// Render the fragment, appending any bound values to `params`
    pub fn build(&self, dialect: &dyn Dialect, params: &mut Params) -> String {
        match self {
            Expr::Raw { sql, params: own } => {
                params.extend(own);
                sql.clone()
            }
            Expr::Hash(map) => build_hash(map, dialect, params),
            Expr::Not(inner) => {
                let sql = inner.build(dialect, params);
                if sql.is_empty() {
                    String::new()
                } else {
                    format!("NOT ({})", sql)
                }
            }
            Expr::AndOr { op, exprs } => {
                let parts: Vec<String> = exprs
                    .iter()
                    .map(|e| e.build(dialect, params))
                    .filter(|sql| !sql.is_empty())
                    .collect();
                match parts.len() {
                    0 => String::new(),
                    1 => parts.into_iter().next().unwrap_or_default(),
                    _ => format!("({})", parts.join(&format!(") {} (", op))),
                }
            }
            Expr::In {
                column,
                values,
                not,
            } => build_in(column, values, *not, dialect, params),
            Expr::Like(like) => like.build(dialect, params),
            Expr::Exists { expr, not } => {
                let sql = expr.build(dialect, params);
                match (sql.is_empty(), *not) {
                    (true, false) => "0=1".to_string(),
                    (true, true) => String::new(),
                    (false, false) => format!("EXISTS ({})", sql),
                    (false, true) => format!("NOT EXISTS ({})", sql),
                }
            }
            Expr::Between {
                column,
                from,
                to,
                not,
            } => {
                let col = dialect.quote_column_name(column);
                let from = params.push_auto(from.clone());
                let to = params.push_auto(to.clone());
                let keyword = if *not { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {} {{:{}}} AND {{:{}}}", col, keyword, from, to)
            }
            Expr::Custom(custom) => custom.build(dialect, params),
        }
    }
}

impl Expression for Expr {
    fn build(&self, dialect: &dyn Dialect, params: &mut Params) -> String {
        Expr::build(self, dialect, params)
    }
}

impl From<LikeExp> for Expr {
    fn from(e: LikeExp) -> Self {
        Expr::Like(e)
    }
}

impl From<&str> for Expr {
    fn from(sql: &str) -> Self {
        Expr::raw(sql)
    }
}

impl From<String> for Expr {
    fn from(sql: String) -> Self {
        Expr::raw(sql)
    }
}

fn build_hash(map: &BTreeMap<String, Operand>, dialect: &dyn Dialect, params: &mut Params) -> String {
    let mut parts = Vec::with_capacity(map.len());
    for (name, value) in map {
        match value {
            Operand::Value(Value::Null) => {
                parts.push(format!("{} IS NULL", dialect.quote_column_name(name)));
            }
            Operand::Value(Value::Array(items)) => {
                let values: Vec<Operand> = items.iter().cloned().map(Operand::Value).collect();
                let sql = build_in(name, &values, false, dialect, params);
                if !sql.is_empty() {
                    parts.push(sql);
                }
            }
            Operand::Value(v) => {
                let pn = params.push_auto(v.clone());
                parts.push(format!("{}={{:{}}}", dialect.quote_column_name(name), pn));
            }
            Operand::Expr(e) => {
                let sql = e.build(dialect, params);
                if !sql.is_empty() {
                    parts.push(format!("({})", sql));
                }
            }
        }
    }
    parts.join(" AND ")
}

fn build_in(
    column: &str,
    values: &[Operand],
    not: bool,
    dialect: &dyn Dialect,
    params: &mut Params,
) -> String {
    if values.is_empty() {
        return if not { String::new() } else { "0=1".to_string() };
    }

    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            Operand::Value(Value::Null) => "NULL".to_string(),
            other => other.render(dialect, params),
        })
        .collect();

    let col = dialect.quote_column_name(column);
    if rendered.len() == 1 {
        let op = if not { "<>" } else { "=" };
        return format!("{}{}{}", col, op, rendered[0]);
    }
    let keyword = if not { "NOT IN" } else { "IN" };
    format!("{} {} ({})", col, keyword, rendered.join(", "))
}

/// Pattern-match expression builder.
///
/// Reserved characters are escaped with the ordered escape table before the
/// `%` wildcards are added.
#[derive(Debug, Clone)]
pub struct LikeExp {
    column: String,
    values: Vec<String>,
    op: String,
    or: bool,
    left: bool,
    right: bool,
    escape: Vec<(String, String)>,
}

impl LikeExp {
    fn new<I, S>(column: impl Into<String>, values: I, op: &str, or: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            op: op.to_string(),
            or,
            left: true,
            right: true,
            escape: default_like_escape(),
        }
    }

    /// Replace the escape table. Pairs are applied in order as `(from, to)`.
    pub fn escape<I, A, B>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.escape = pairs
            .into_iter()
            .map(|(a, b)| (a.into(), b.into()))
            .collect();
        self
    }

    /// Choose which sides receive a `%` wildcard
    pub fn match_sides(mut self, left: bool, right: bool) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Override the operator keyword, e.g. `ILIKE`
    pub fn op(mut self, op: impl Into<String>) -> Self {
        self.op = op.into();
        self
    }

    pub fn build(&self, dialect: &dyn Dialect, params: &mut Params) -> String {
        if self.values.is_empty() {
            return String::new();
        }

        let col = dialect.quote_column_name(&self.column);
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|value| {
                let mut value = value.clone();
                for (from, to) in &self.escape {
                    value = value.replace(from.as_str(), to);
                }
                if self.left {
                    value.insert(0, '%');
                }
                if self.right {
                    value.push('%');
                }
                let name = params.push_auto(value);
                format!("{} {} {{:{}}}", col, self.op, name)
            })
            .collect();

        parts.join(if self.or { " OR " } else { " AND " })
    }
}

impl Expression for LikeExp {
    fn build(&self, dialect: &dyn Dialect, params: &mut Params) -> String {
        LikeExp::build(self, dialect, params)
    }
}

fn default_like_escape() -> Vec<(String, String)> {
    vec![
        ("\\".to_string(), "\\\\".to_string()),
        ("%".to_string(), "\\%".to_string()),
        ("_".to_string(), "\\_".to_string()),
    ]
}
