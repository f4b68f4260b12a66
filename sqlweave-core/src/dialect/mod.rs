//! SQL dialects
//!
//! A [`Dialect`] knows how one database family quotes identifiers, spells
//! anonymous placeholders and renders each clause. The trait's default
//! methods are the ANSI-flavoured base used by [`Standard`]; each concrete
//! dialect overrides only what differs.
//!
//! Statement and DDL renderers return a [`Statement`] (template SQL with
//! `{:pN}` references plus the bound values). The [`Db`](crate::Db) facade
//! turns it into an executable [`Query`](crate::Query).

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod registry;
mod sqlite;
mod standard;

pub use mssql::MsSql;
pub use mysql::MySql;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use registry::{DialectFactory, DialectRegistry};
pub use sqlite::Sqlite;
pub use standard::Standard;

use crate::expression::{Expr, Operand};
use crate::preprocess::placeholder_regex;
use crate::select::{JoinInfo, UnionInfo};
use crate::{Error, Params, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

/// Column values for insert, upsert and update, kept sorted by column name
pub type Columns = BTreeMap<String, Operand>;

/// Build a [`Columns`] map from `(name, value)` pairs
pub fn columns<I, K, V>(pairs: I) -> Columns
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Operand>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A rendered statement template and its bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Column and table aliases: `name AS alias` or `name alias`
fn alias_regex() -> &'static Regex {
    static ALIAS_RE: OnceLock<Regex> = OnceLock::new();
    ALIAS_RE.get_or_init(|| {
        Regex::new(r"(?i:\s+as\s+|\s+)([A-Za-z0-9_\-.]+)$").expect("invalid built-in alias regex")
    })
}

fn order_regex() -> &'static Regex {
    static ORDER_RE: OnceLock<Regex> = OnceLock::new();
    ORDER_RE.get_or_init(|| {
        Regex::new(r"\s+((?i)ASC|DESC)$").expect("invalid built-in order regex")
    })
}

/// Split a trailing alias off `s`, returning `(name, alias)`
fn split_alias(s: &str) -> Option<(&str, &str)> {
    let caps = alias_regex().captures(s)?;
    let whole = caps.get(0)?;
    let alias = caps.get(1)?;
    Some((&s[..whole.start()], alias.as_str()))
}

/// Upcast helper so default methods can hand `self` to expressions
pub trait AsDialect {
    fn as_dialect(&self) -> &dyn Dialect;
}

impl<T: Dialect> AsDialect for T {
    fn as_dialect(&self) -> &dyn Dialect {
        self
    }
}

/// Per-database rendering strategy
pub trait Dialect: AsDialect + fmt::Debug + Send + Sync {
    /// Short dialect name used in error messages
    fn name(&self) -> &'static str {
        "standard"
    }

    /// Anonymous placeholder for the `index`-th parameter, counting from 1
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Quote a string literal
    fn quote(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Quote a table name without a schema prefix.
    /// Names already containing the quote character pass through.
    fn quote_simple_table_name(&self, s: &str) -> String {
        if s.contains('"') {
            return s.to_string();
        }
        format!("\"{}\"", s)
    }

    /// Quote a column name without a table prefix
    fn quote_simple_column_name(&self, s: &str) -> String {
        if s.contains('"') || s == "*" {
            return s.to_string();
        }
        format!("\"{}\"", s)
    }

    /// Quote a possibly schema-qualified table name, segment by segment.
    /// Names containing `(` or `{{` are left untouched.
    fn quote_table_name(&self, s: &str) -> String {
        if s.contains('(') || s.contains("{{") {
            return s.to_string();
        }
        s.split('.')
            .map(|part| self.quote_simple_table_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a possibly table-qualified column name.
    /// Names containing `(`, `{{` or `[[` are left untouched.
    fn quote_column_name(&self, s: &str) -> String {
        if s.contains('(') || s.contains("{{") || s.contains("[[") {
            return s.to_string();
        }
        match s.rfind('.') {
            Some(pos) => format!(
                "{}.{}",
                self.quote_table_name(&s[..pos]),
                self.quote_simple_column_name(&s[pos + 1..])
            ),
            None => self.quote_simple_column_name(s),
        }
    }

    fn build_select(&self, cols: &[String], distinct: bool, option: &str) -> String {
        let list = cols
            .iter()
            .map(|col| match split_alias(col) {
                Some((name, alias)) => format!(
                    "{} AS {}",
                    self.quote_column_name(name),
                    self.quote_simple_column_name(alias)
                ),
                None => self.quote_column_name(col),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = String::from("SELECT");
        if distinct {
            sql.push_str(" DISTINCT");
        }
        if !option.is_empty() {
            sql.push(' ');
            sql.push_str(option);
        }
        sql.push(' ');
        sql.push_str(if list.is_empty() { "*" } else { &list });
        sql
    }

    fn build_from(&self, tables: &[String]) -> String {
        if tables.is_empty() {
            return String::new();
        }
        let list: Vec<String> = tables
            .iter()
            .map(|t| self.quote_table_name_and_alias(t))
            .collect();
        format!("FROM {}", list.join(", "))
    }

    fn quote_table_name_and_alias(&self, table: &str) -> String {
        match split_alias(table) {
            Some((name, alias)) => format!(
                "{} {}",
                self.quote_table_name(name),
                self.quote_simple_table_name(alias)
            ),
            None => self.quote_table_name(table),
        }
    }

    fn build_join(&self, joins: &[JoinInfo], params: &mut Params) -> String {
        joins
            .iter()
            .map(|join| {
                let mut sql = format!("{} {}", join.kind, self.quote_table_name_and_alias(&join.table));
                let on = join
                    .on
                    .as_ref()
                    .map(|e| e.build(self.as_dialect(), params))
                    .unwrap_or_default();
                if !on.is_empty() {
                    sql.push_str(" ON ");
                    sql.push_str(&on);
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_where(&self, expr: Option<&Expr>, params: &mut Params) -> String {
        keyword_clause("WHERE", expr.map(|e| e.build(self.as_dialect(), params)))
    }

    fn build_having(&self, expr: Option<&Expr>, params: &mut Params) -> String {
        keyword_clause("HAVING", expr.map(|e| e.build(self.as_dialect(), params)))
    }

    fn build_group_by(&self, cols: &[String]) -> String {
        if cols.is_empty() {
            return String::new();
        }
        let list: Vec<String> = cols.iter().map(|c| self.quote_column_name(c)).collect();
        format!("GROUP BY {}", list.join(", "))
    }

    fn build_order_by(&self, cols: &[String]) -> String {
        if cols.is_empty() {
            return String::new();
        }
        let list: Vec<String> = cols
            .iter()
            .map(|col| match order_regex().captures(col) {
                Some(caps) => {
                    let start = caps.get(0).map_or(col.len(), |m| m.start());
                    let dir = caps.get(1).map_or("", |m| m.as_str());
                    format!("{} {}", self.quote_column_name(&col[..start]), dir)
                }
                None => self.quote_column_name(col),
            })
            .collect();
        format!("ORDER BY {}", list.join(", "))
    }

    /// `LIMIT n OFFSET m`. An offset without a limit gets the maximum limit.
    fn build_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let offset = offset.filter(|&o| o > 0);
        let limit = match (limit, offset) {
            (None, Some(_)) => Some(i64::MAX as u64),
            (limit, _) => limit,
        };
        let mut parts = Vec::with_capacity(2);
        if let Some(limit) = limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            parts.push(format!("OFFSET {}", offset));
        }
        parts.join(" ")
    }

    fn build_order_by_and_limit(
        &self,
        sql: String,
        cols: &[String],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> String {
        let mut sql = sql;
        let order_by = self.build_order_by(cols);
        if !order_by.is_empty() {
            sql.push(' ');
            sql.push_str(&order_by);
        }
        let limit = self.build_limit(limit, offset);
        if !limit.is_empty() {
            sql.push(' ');
            sql.push_str(&limit);
        }
        sql
    }

    /// Union members keep their own bindings; names already taken in
    /// `params` are renamed in the member's template.
    fn build_union(&self, unions: &[UnionInfo], params: &mut Params) -> String {
        unions
            .iter()
            .map(|union| {
                let sql = merge_params(union.query.sql(), union.query.params(), params);
                let keyword = if union.all { "UNION ALL" } else { "UNION" };
                format!("{} ({})", keyword, sql)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `INSERT INTO t (cols) VALUES (vals)` with columns in name order
    fn insert(&self, table: &str, cols: &Columns) -> Result<Statement> {
        let mut params = Params::new();
        let mut names = Vec::with_capacity(cols.len());
        let mut values = Vec::with_capacity(cols.len());
        for (name, value) in cols {
            names.push(self.quote_column_name(name));
            values.push(value.render(self.as_dialect(), &mut params));
        }

        let sql = if names.is_empty() {
            self.insert_default_values(table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.quote_table_name(table),
                names.join(", "),
                values.join(", ")
            )
        };
        Ok(Statement::with_params(sql, params))
    }

    /// Zero-column insert
    fn insert_default_values(&self, table: &str) -> String {
        format!("INSERT INTO {} DEFAULT VALUES", self.quote_table_name(table))
    }

    /// Insert, or update the existing row on a key conflict
    fn upsert(&self, _table: &str, _cols: &Columns, _constraints: &[String]) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "UPSERT"))
    }

    fn update(&self, table: &str, cols: &Columns, filter: Option<&Expr>) -> Result<Statement> {
        let mut params = Params::new();
        let lines = self.set_list(cols, &mut params);
        let mut sql = format!("UPDATE {} SET {}", self.quote_table_name(table), lines);
        append_where(&mut sql, filter.map(|e| e.build(self.as_dialect(), &mut params)));
        Ok(Statement::with_params(sql, params))
    }

    /// `col=value, ...` in column order, continuing the numbering of `params`
    fn set_list(&self, cols: &Columns, params: &mut Params) -> String {
        cols.iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    self.quote_column_name(name),
                    value.render(self.as_dialect(), params)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn delete(&self, table: &str, filter: Option<&Expr>) -> Result<Statement> {
        let mut params = Params::new();
        let mut sql = format!("DELETE FROM {}", self.quote_table_name(table));
        append_where(&mut sql, filter.map(|e| e.build(self.as_dialect(), &mut params)));
        Ok(Statement::with_params(sql, params))
    }

    /// `CREATE TABLE` with column definitions in name order
    fn create_table(
        &self,
        table: &str,
        cols: &BTreeMap<String, String>,
        options: &[String],
    ) -> Result<Statement> {
        let defs: Vec<String> = cols
            .iter()
            .map(|(name, def)| format!("{} {}", self.quote_column_name(name), def))
            .collect();
        let mut sql = format!(
            "CREATE TABLE {} ({})",
            self.quote_table_name(table),
            defs.join(", ")
        );
        for option in options {
            sql.push(' ');
            sql.push_str(option);
        }
        Ok(Statement::new(sql))
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "RENAME TABLE {} TO {}",
            self.quote_table_name(old_name),
            self.quote_table_name(new_name)
        )))
    }

    fn drop_table(&self, table: &str) -> Result<Statement> {
        Ok(Statement::new(format!("DROP TABLE {}", self.quote_table_name(table))))
    }

    fn truncate_table(&self, table: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "TRUNCATE TABLE {}",
            self.quote_table_name(table)
        )))
    }

    fn add_column(&self, table: &str, col: &str, typ: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD {} {}",
            self.quote_table_name(table),
            self.quote_column_name(col),
            typ
        )))
    }

    fn drop_column(&self, table: &str, col: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table_name(table),
            self.quote_column_name(col)
        )))
    }

    fn rename_column(&self, table: &str, old_name: &str, new_name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_table_name(table),
            self.quote_column_name(old_name),
            self.quote_column_name(new_name)
        )))
    }

    fn alter_column(&self, table: &str, col: &str, typ: &str) -> Result<Statement> {
        let col = self.quote_column_name(col);
        Ok(Statement::new(format!(
            "ALTER TABLE {} CHANGE {} {} {}",
            self.quote_table_name(table),
            col,
            col,
            typ
        )))
    }

    fn add_primary_key(&self, table: &str, name: &str, cols: &[String]) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_table_name(table),
            self.quote_column_name(name),
            self.quote_columns(cols)
        )))
    }

    fn drop_primary_key(&self, table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_table_name(table),
            self.quote_column_name(name)
        )))
    }

    fn add_foreign_key(&self, table: &str, fk: &ForeignKey) -> Result<Statement> {
        if fk.columns.len() != fk.ref_columns.len() {
            return Err(Error::invalid_query(format!(
                "foreign key '{}' maps {} columns onto {}",
                fk.name,
                fk.columns.len(),
                fk.ref_columns.len()
            )));
        }
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_table_name(table),
            self.quote_column_name(&fk.name),
            self.quote_columns(&fk.columns),
            self.quote_table_name(&fk.ref_table),
            self.quote_columns(&fk.ref_columns)
        );
        for option in &fk.options {
            sql.push(' ');
            sql.push_str(option);
        }
        Ok(Statement::new(sql))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_table_name(table),
            self.quote_column_name(name)
        )))
    }

    fn create_index(&self, table: &str, name: &str, cols: &[String]) -> Result<Statement> {
        Ok(Statement::new(format!(
            "CREATE INDEX {} ON {} ({})",
            self.quote_column_name(name),
            self.quote_table_name(table),
            self.quote_columns(cols)
        )))
    }

    fn create_unique_index(&self, table: &str, name: &str, cols: &[String]) -> Result<Statement> {
        Ok(Statement::new(format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.quote_column_name(name),
            self.quote_table_name(table),
            self.quote_columns(cols)
        )))
    }

    fn drop_index(&self, table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "DROP INDEX {} ON {}",
            self.quote_column_name(name),
            self.quote_table_name(table)
        )))
    }

    fn quote_columns(&self, cols: &[String]) -> String {
        cols.iter()
            .map(|c| self.quote_column_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A foreign key constraint definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    /// Trailing clauses such as `ON DELETE CASCADE`
    pub options: Vec<String>,
}

impl ForeignKey {
    pub fn new<I, S, J, T>(
        name: impl Into<String>,
        columns: I,
        ref_table: impl Into<String>,
        ref_columns: J,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

fn keyword_clause(keyword: &str, body: Option<String>) -> String {
    match body {
        Some(body) if !body.is_empty() => format!("{} {}", keyword, body),
        _ => String::new(),
    }
}

/// Move `own` into `params`, renaming colliding names in `sql`
fn merge_params(sql: &str, own: &Params, params: &mut Params) -> String {
    let mut renamed: HashMap<&str, String> = HashMap::new();
    for (name, value) in own.iter() {
        if params.contains(name) {
            renamed.insert(name, params.push_auto(value.clone()));
        } else {
            params.insert(name, value.clone());
        }
    }
    if renamed.is_empty() {
        return sql.to_string();
    }
    placeholder_regex()
        .replace_all(sql, |caps: &Captures| match renamed.get(&caps[1]) {
            Some(fresh) => format!("{{:{}}}", fresh),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn append_where(sql: &mut String, filter: Option<String>) {
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(&filter);
    }
}

/// `INSERT ... <suffix> col=val, ...` shared by the dialects that support upsert
pub(crate) fn upsert_with<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    cols: &Columns,
    clause: &str,
) -> Result<Statement> {
    let mut stmt = dialect.insert(table, cols)?;
    let lines = dialect.set_list(cols, &mut stmt.params);
    stmt.sql.push(' ');
    stmt.sql.push_str(clause);
    stmt.sql.push(' ');
    stmt.sql.push_str(&lines);
    Ok(stmt)
}
