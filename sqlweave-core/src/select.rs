//! SELECT query builder

use crate::dialect::Dialect;
use crate::executor::Executor;
use crate::{Expr, Params, Query, Result, Value};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// One JOIN clause
#[derive(Debug, Clone)]
pub struct JoinInfo {
    /// Join keyword, e.g. `INNER JOIN`
    pub kind: String,
    pub table: String,
    pub on: Option<Expr>,
}

/// One UNION clause
#[derive(Debug, Clone)]
pub struct UnionInfo {
    pub all: bool,
    pub query: Query,
}

/// Immutable SELECT builder.
///
/// Every method consumes the builder and returns the updated one;
/// [`build`](SelectQuery::build) renders the final [`Query`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sqlweave_core::{dialect::MySql, Expr, SelectQuery};
///
/// let query = SelectQuery::new(Arc::new(MySql))
///     .select(["id", "name"])
///     .from(["users"])
///     .where_(Expr::hash([("status", 1)]))
///     .order_by(["id DESC"])
///     .limit(10)
///     .build();
///
/// assert_eq!(
///     query.raw_sql(),
///     "SELECT `id`, `name` FROM `users` WHERE `status`=? ORDER BY `id` DESC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SelectQuery {
    dialect: Arc<dyn Dialect>,
    selects: Vec<String>,
    distinct: bool,
    select_option: String,
    from: Vec<String>,
    where_: Option<Expr>,
    joins: Vec<JoinInfo>,
    order_by: Vec<String>,
    group_by: Vec<String>,
    having: Option<Expr>,
    unions: Vec<UnionInfo>,
    limit: Option<u64>,
    offset: Option<u64>,
    params: Params,
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

fn and_combine(current: Option<Expr>, expr: Expr) -> Option<Expr> {
    Some(match current {
        Some(current) => Expr::and([current, expr]),
        None => expr,
    })
}

fn or_combine(current: Option<Expr>, expr: Expr) -> Option<Expr> {
    Some(match current {
        Some(current) => Expr::or([current, expr]),
        None => expr,
    })
}

impl SelectQuery {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            selects: Vec::new(),
            distinct: false,
            select_option: String::new(),
            from: Vec::new(),
            where_: None,
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: None,
            unions: Vec::new(),
            limit: None,
            offset: None,
            params: Params::new(),
        }
    }

    /// Replace the selected columns. `col AS alias` and `col alias` are accepted.
    pub fn select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selects = strings(cols);
        self
    }

    pub fn and_select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selects.extend(strings(cols));
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Keyword emitted after `SELECT`, e.g. `SQL_CALC_FOUND_ROWS`
    pub fn select_option(mut self, option: impl Into<String>) -> Self {
        self.select_option = option.into();
        self
    }

    pub fn from<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from = strings(tables);
        self
    }

    pub fn where_(mut self, expr: impl Into<Expr>) -> Self {
        self.where_ = Some(expr.into());
        self
    }

    pub fn and_where(mut self, expr: impl Into<Expr>) -> Self {
        self.where_ = and_combine(self.where_.take(), expr.into());
        self
    }

    pub fn or_where(mut self, expr: impl Into<Expr>) -> Self {
        self.where_ = or_combine(self.where_.take(), expr.into());
        self
    }

    pub fn join(mut self, kind: impl Into<String>, table: impl Into<String>, on: Option<Expr>) -> Self {
        self.joins.push(JoinInfo {
            kind: kind.into(),
            table: table.into(),
            on,
        });
        self
    }

    pub fn inner_join(self, table: impl Into<String>, on: impl Into<Expr>) -> Self {
        self.join("INNER JOIN", table, Some(on.into()))
    }

    pub fn left_join(self, table: impl Into<String>, on: impl Into<Expr>) -> Self {
        self.join("LEFT JOIN", table, Some(on.into()))
    }

    pub fn right_join(self, table: impl Into<String>, on: impl Into<Expr>) -> Self {
        self.join("RIGHT JOIN", table, Some(on.into()))
    }

    /// Replace the ordering. A trailing `ASC` or `DESC` is kept.
    pub fn order_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = strings(cols);
        self
    }

    pub fn and_order_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by.extend(strings(cols));
        self
    }

    pub fn group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = strings(cols);
        self
    }

    pub fn and_group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(strings(cols));
        self
    }

    pub fn having(mut self, expr: impl Into<Expr>) -> Self {
        self.having = Some(expr.into());
        self
    }

    pub fn and_having(mut self, expr: impl Into<Expr>) -> Self {
        self.having = and_combine(self.having.take(), expr.into());
        self
    }

    pub fn or_having(mut self, expr: impl Into<Expr>) -> Self {
        self.having = or_combine(self.having.take(), expr.into());
        self
    }

    pub fn union(mut self, query: Query) -> Self {
        self.unions.push(UnionInfo { all: false, query });
        self
    }

    pub fn union_all(mut self, query: Query) -> Self {
        self.unions.push(UnionInfo { all: true, query });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Replace the extra bindings for `{:name}` placeholders in raw fragments
    pub fn bind(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn and_bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Render every clause through the dialect
    pub fn build(&self) -> Query {
        let d = self.dialect.as_ref();
        let mut params = self.params.clone();

        let clauses = [
            d.build_select(&self.selects, self.distinct, &self.select_option),
            d.build_from(&self.from),
            d.build_join(&self.joins, &mut params),
            d.build_where(self.where_.as_ref(), &mut params),
            d.build_group_by(&self.group_by),
            d.build_having(self.having.as_ref(), &mut params),
        ];
        let sql = clauses
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let mut sql = d.build_order_by_and_limit(sql, &self.order_by, self.limit, self.offset);
        let union = d.build_union(&self.unions, &mut params);
        if !union.is_empty() {
            sql = format!("({}) {}", sql, union);
        }

        Query::new(Arc::clone(&self.dialect), sql).bind(params)
    }

    pub async fn all<T, E>(&self, executor: &E) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.build().all(executor).await
    }

    pub async fn one<T, E>(&self, executor: &E) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.build().one(executor).await
    }

    pub async fn optional<T, E>(&self, executor: &E) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.build().optional(executor).await
    }
}
