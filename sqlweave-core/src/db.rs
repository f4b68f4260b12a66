//! The database facade

use crate::config::DbConfig;
use crate::dialect::{Columns, Dialect, DialectRegistry, ForeignKey, Statement};
use crate::mapping::{column_mapping, default_field_mapper, short_type_name, FieldMapper, Record};
use crate::model::ModelQuery;
use crate::{Error, Expr, Query, Result, SelectQuery, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entry point tying a dialect to a field naming policy.
///
/// `Db` only renders statements; pass the resulting [`Query`] values to an
/// [`Executor`](crate::Executor) to run them.
///
/// # Examples
///
/// ```
/// use sqlweave_core::{columns, dialect::DialectRegistry, Db};
///
/// let registry = DialectRegistry::default();
/// let db = Db::new(&registry, "postgres");
///
/// let query = db
///     .insert("users", &columns([("name", "James"), ("email", "james@example.com")]))
///     .unwrap();
/// assert_eq!(query.raw_sql(), r#"INSERT INTO "users" ("email", "name") VALUES ($1, $2)"#);
/// ```
#[derive(Debug, Clone)]
pub struct Db {
    dialect: Arc<dyn Dialect>,
    field_mapper: FieldMapper,
    driver_name: String,
}

impl Db {
    /// Resolve `driver` through `registry`; unknown drivers use the standard dialect
    pub fn new(registry: &DialectRegistry, driver: impl Into<String>) -> Self {
        let driver_name = driver.into();
        Self {
            dialect: registry.resolve(&driver_name),
            field_mapper: default_field_mapper,
            driver_name,
        }
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            driver_name: dialect.name().to_string(),
            dialect,
            field_mapper: default_field_mapper,
        }
    }

    pub fn from_config(registry: &DialectRegistry, config: &DbConfig) -> Self {
        Self::new(registry, config.driver.clone()).with_field_mapper(config.field_mapping.mapper())
    }

    /// Replace the naming policy used for record columns
    pub fn with_field_mapper(mut self, mapper: FieldMapper) -> Self {
        self.field_mapper = mapper;
        self
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn field_mapper(&self) -> FieldMapper {
        self.field_mapper
    }

    pub fn quote_table_name(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    pub fn quote_column_name(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    /// A query from a raw SQL template
    pub fn new_query(&self, sql: impl Into<String>) -> Query {
        Query::new(Arc::clone(&self.dialect), sql)
    }

    pub fn select<I, S>(&self, cols: I) -> SelectQuery
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectQuery::new(Arc::clone(&self.dialect)).select(cols)
    }

    /// Insert, update and delete statements for `record`
    pub fn model<'a, T: Record>(&'a self, record: &'a T) -> ModelQuery<'a, T> {
        ModelQuery::new(self, record, column_mapping::<T>(self.field_mapper))
    }

    /// Select the row of `T` whose single primary key equals `pk`
    pub fn select_by_pk<T: Record>(&self, pk: impl Into<Value>) -> Result<SelectQuery> {
        let mapping = column_mapping::<T>(self.field_mapper);
        if mapping.is_empty() {
            return Err(Error::not_a_record(short_type_name::<T>()));
        }
        let pk_column = match mapping.pk_db_names().as_slice() {
            [] => return Err(Error::missing_primary_key(short_type_name::<T>())),
            [column] => column.to_string(),
            columns => {
                return Err(Error::composite_primary_key(
                    short_type_name::<T>(),
                    columns.len(),
                ))
            }
        };
        let pk: Value = pk.into();
        Ok(SelectQuery::new(Arc::clone(&self.dialect))
            .from([T::table_name()])
            .where_(Expr::hash([(pk_column, pk)])))
    }

    pub(crate) fn statement_query(&self, stmt: Statement) -> Query {
        self.new_query(stmt.sql).bind(stmt.params)
    }

    pub fn insert(&self, table: &str, cols: &Columns) -> Result<Query> {
        Ok(self.statement_query(self.dialect.insert(table, cols)?))
    }

    /// Insert, or update the existing row when `constraints` conflict
    pub fn upsert(&self, table: &str, cols: &Columns, constraints: &[String]) -> Result<Query> {
        Ok(self.statement_query(self.dialect.upsert(table, cols, constraints)?))
    }

    pub fn update(&self, table: &str, cols: &Columns, filter: Option<&Expr>) -> Result<Query> {
        Ok(self.statement_query(self.dialect.update(table, cols, filter)?))
    }

    pub fn delete(&self, table: &str, filter: Option<&Expr>) -> Result<Query> {
        Ok(self.statement_query(self.dialect.delete(table, filter)?))
    }

    pub fn create_table(
        &self,
        table: &str,
        cols: &BTreeMap<String, String>,
        options: &[String],
    ) -> Result<Query> {
        Ok(self.statement_query(self.dialect.create_table(table, cols, options)?))
    }

    pub fn rename_table(&self, old_name: &str, new_name: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.rename_table(old_name, new_name)?))
    }

    pub fn drop_table(&self, table: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.drop_table(table)?))
    }

    pub fn truncate_table(&self, table: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.truncate_table(table)?))
    }

    pub fn add_column(&self, table: &str, col: &str, typ: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.add_column(table, col, typ)?))
    }

    pub fn drop_column(&self, table: &str, col: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.drop_column(table, col)?))
    }

    pub fn rename_column(&self, table: &str, old_name: &str, new_name: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.rename_column(table, old_name, new_name)?))
    }

    pub fn alter_column(&self, table: &str, col: &str, typ: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.alter_column(table, col, typ)?))
    }

    pub fn add_primary_key(&self, table: &str, name: &str, cols: &[String]) -> Result<Query> {
        Ok(self.statement_query(self.dialect.add_primary_key(table, name, cols)?))
    }

    pub fn drop_primary_key(&self, table: &str, name: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.drop_primary_key(table, name)?))
    }

    pub fn add_foreign_key(&self, table: &str, fk: &ForeignKey) -> Result<Query> {
        Ok(self.statement_query(self.dialect.add_foreign_key(table, fk)?))
    }

    pub fn drop_foreign_key(&self, table: &str, name: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.drop_foreign_key(table, name)?))
    }

    pub fn create_index(&self, table: &str, name: &str, cols: &[String]) -> Result<Query> {
        Ok(self.statement_query(self.dialect.create_index(table, name, cols)?))
    }

    pub fn create_unique_index(&self, table: &str, name: &str, cols: &[String]) -> Result<Query> {
        Ok(self.statement_query(self.dialect.create_unique_index(table, name, cols)?))
    }

    pub fn drop_index(&self, table: &str, name: &str) -> Result<Query> {
        Ok(self.statement_query(self.dialect.drop_index(table, name)?))
    }
}
