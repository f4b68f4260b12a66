//! Executable queries

use crate::dialect::Dialect;
use crate::executor::{ExecResult, Executor};
use crate::preprocess::{placeholder_regex, process_sql};
use crate::{Error, Params, Result, Value};
use regex::Captures;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// A SQL statement template, its dialect rendering and its bindings.
///
/// The template keeps `{:name}` placeholders; the rendered SQL carries the
/// dialect's own placeholders. A query can be re-bound and executed any
/// number of times.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sqlweave_core::{dialect::Postgres, Params, Query, Value};
///
/// let query = Query::new(Arc::new(Postgres), "SELECT * FROM {{users}} WHERE [[id]]={:id}")
///     .bind(Params::new().with("id", 7));
/// assert_eq!(query.raw_sql(), r#"SELECT * FROM "users" WHERE "id"=$1"#);
/// assert_eq!(query.args().unwrap(), vec![Value::I32(7)]);
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    dialect: Arc<dyn Dialect>,
    sql: String,
    raw_sql: String,
    placeholders: Vec<String>,
    params: Params,
}

impl Query {
    pub fn new(dialect: Arc<dyn Dialect>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let (raw_sql, placeholders) = process_sql(dialect.as_ref(), &sql);
        Self {
            dialect,
            sql,
            raw_sql,
            placeholders,
            params: Params::new(),
        }
    }

    /// The template as given, with `{:name}` placeholders
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The SQL sent to the executor
    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    /// Placeholder names in occurrence order
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Merge `params` into the current bindings
    pub fn bind(mut self, params: Params) -> Self {
        self.params.extend(&params);
        self
    }

    /// Bind a single named value
    pub fn bind_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Argument values in placeholder order.
    ///
    /// Fails with [`Error::MissingParameter`] naming the first placeholder
    /// without a binding.
    pub fn args(&self) -> Result<Vec<Value>> {
        self.placeholders
            .iter()
            .map(|name| {
                self.params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::missing_parameter(name.clone()))
            })
            .collect()
    }

    /// The template with bound values inlined, for logs only
    pub fn log_sql(&self) -> String {
        placeholder_regex()
            .replace_all(&self.sql, |caps: &Captures| match self.params.get(&caps[1]) {
                Some(value) => value.to_literal(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    pub async fn prepare<E: Executor>(&self, executor: &E) -> Result<()> {
        self.prepare_with_context(executor, None).await
    }

    pub async fn prepare_with_context<E: Executor>(
        &self,
        executor: &E,
        ctx: Option<&E::Context>,
    ) -> Result<()> {
        executor.prepare(ctx, &self.raw_sql).await
    }

    /// Execute a statement that returns no rows
    pub async fn execute<E: Executor>(&self, executor: &E) -> Result<ExecResult> {
        self.execute_with_context(executor, None).await
    }

    pub async fn execute_with_context<E: Executor>(
        &self,
        executor: &E,
        ctx: Option<&E::Context>,
    ) -> Result<ExecResult> {
        let args = self.args()?;
        let started = Instant::now();
        let result = executor.execute(ctx, &self.raw_sql, &args).await;
        self.log_outcome("execute", started, &result);
        result
    }

    /// Fetch every row
    pub async fn all<T, E>(&self, executor: &E) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.all_with_context(executor, None).await
    }

    pub async fn all_with_context<T, E>(
        &self,
        executor: &E,
        ctx: Option<&E::Context>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        let args = self.args()?;
        let started = Instant::now();
        let result = executor.fetch_all(ctx, &self.raw_sql, &args).await;
        self.log_outcome("query", started, &result);
        result
    }

    /// Fetch exactly one row
    pub async fn one<T, E>(&self, executor: &E) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.one_with_context(executor, None).await
    }

    pub async fn one_with_context<T, E>(&self, executor: &E, ctx: Option<&E::Context>) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        let args = self.args()?;
        let started = Instant::now();
        let result = executor.fetch_one(ctx, &self.raw_sql, &args).await;
        self.log_outcome("query", started, &result);
        result
    }

    /// Fetch the first row, if any
    pub async fn optional<T, E>(&self, executor: &E) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        self.optional_with_context(executor, None).await
    }

    pub async fn optional_with_context<T, E>(
        &self,
        executor: &E,
        ctx: Option<&E::Context>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        let args = self.args()?;
        let started = Instant::now();
        let result = executor.fetch_optional(ctx, &self.raw_sql, &args).await;
        self.log_outcome("query", started, &result);
        result
    }

    fn log_outcome<T>(&self, kind: &'static str, started: Instant, result: &Result<T>) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(_) => tracing::debug!(
                target: "sqlweave::query",
                kind,
                elapsed_ms,
                sql = %self.log_sql(),
                "statement executed"
            ),
            Err(err) => tracing::warn!(
                target: "sqlweave::query",
                kind,
                elapsed_ms,
                sql = %self.log_sql(),
                error = %err,
                "statement failed"
            ),
        }
    }
}
