//! Statement execution interface
//!
//! The engine never talks to a database itself. An [`Executor`] receives the
//! dialect SQL and the argument values in placeholder order, plus an optional
//! context (deadline, cancellation token, tracing span...) whose meaning is
//! entirely up to the executor.

use crate::{Result, Value};
use serde::de::DeserializeOwned;
use std::future::Future;

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key of the last inserted row, when the driver reports one
    pub last_insert_id: Option<i64>,
}

/// Trait for database executors (pools, connections, transactions)
pub trait Executor: Send + Sync {
    /// Opaque per-call context passed through unchanged by the engine
    type Context: Send + Sync;

    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE, DDL)
    fn execute(
        &self,
        ctx: Option<&Self::Context>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult>> + Send;

    /// Execute a query that returns multiple rows
    fn fetch_all<T>(
        &self,
        ctx: Option<&Self::Context>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns a single row
    fn fetch_one<T>(
        &self,
        ctx: Option<&Self::Context>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns an optional row
    fn fetch_optional<T>(
        &self,
        ctx: Option<&Self::Context>,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Prepare `sql` ahead of execution. Executors without an explicit
    /// prepare step accept every statement.
    fn prepare(
        &self,
        _ctx: Option<&Self::Context>,
        _sql: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use crate::Error;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::{Column, Executor as _, PgPool, Row, TypeInfo};
    use tokio::time::Instant;

    type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

    /// PostgreSQL connection pool wrapper.
    ///
    /// Its context is a deadline; statements still running when it passes
    /// fail with [`Error::Timeout`].
    #[derive(Clone)]
    pub struct PostgresPool {
        inner: PgPool,
    }

    impl PostgresPool {
        /// Create a new PostgreSQL pool from a connection string
        pub async fn new(database_url: &str) -> Result<Self> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self { inner: pool })
        }

        /// Create from an existing PgPool
        pub fn from_pool(pool: PgPool) -> Self {
            Self { inner: pool }
        }
    }

    async fn with_deadline<F, T>(deadline: Option<&Instant>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(*deadline, fut)
                .await
                .map_err(|_| Error::Timeout)?,
            None => fut.await,
        }
    }

    impl Executor for PostgresPool {
        type Context = Instant;

        async fn execute(
            &self,
            ctx: Option<&Instant>,
            sql: &str,
            args: &[Value],
        ) -> Result<ExecResult> {
            with_deadline(ctx, async {
                let query = bind_values_to_query(sqlx::query(sql), args);
                let result = query.execute(&self.inner).await?;
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: None,
                })
            })
            .await
        }

        async fn fetch_all<T>(&self, ctx: Option<&Instant>, sql: &str, args: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            with_deadline(ctx, async {
                let query = bind_values_to_query(sqlx::query(sql), args);
                let rows = query.fetch_all(&self.inner).await?;

                let mut results = Vec::with_capacity(rows.len());
                for row in rows {
                    let json_value = row_to_json_value(&row)?;
                    results.push(serde_json::from_value(json_value)?);
                }
                Ok(results)
            })
            .await
        }

        async fn fetch_one<T>(&self, ctx: Option<&Instant>, sql: &str, args: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            with_deadline(ctx, async {
                let query = bind_values_to_query(sqlx::query(sql), args);
                let row = query.fetch_one(&self.inner).await?;
                Ok(serde_json::from_value(row_to_json_value(&row)?)?)
            })
            .await
        }

        async fn fetch_optional<T>(
            &self,
            ctx: Option<&Instant>,
            sql: &str,
            args: &[Value],
        ) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            with_deadline(ctx, async {
                let query = bind_values_to_query(sqlx::query(sql), args);
                match query.fetch_optional(&self.inner).await? {
                    Some(row) => Ok(Some(serde_json::from_value(row_to_json_value(&row)?)?)),
                    None => Ok(None),
                }
            })
            .await
        }

        async fn prepare(&self, ctx: Option<&Instant>, sql: &str) -> Result<()> {
            with_deadline(ctx, async {
                self.inner.prepare(sql).await?;
                Ok(())
            })
            .await
        }
    }

    /// Bind sqlweave Values to a SQLx query
    fn bind_values_to_query<'q>(mut query: PgQuery<'q>, params: &'q [Value]) -> PgQuery<'q> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i32>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Json(j) => query.bind(j),
                // arrays travel as JSON
                Value::Array(arr) => {
                    query.bind(serde_json::Value::Array(arr.iter().map(value_to_json).collect()))
                }
                #[cfg(feature = "uuid-support")]
                Value::Uuid(u) => query.bind(*u),
                #[cfg(feature = "datetime-support")]
                Value::DateTime(dt) => query.bind(*dt),
                #[cfg(feature = "decimal-support")]
                Value::Decimal(d) => query.bind(*d),
            };
        }
        query
    }

    /// Convert Value to serde_json::Value for array serialization
    pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I32(i) => serde_json::Value::from(*i),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F32(f) => serde_json::Number::from_f64(*f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|byte| (*byte).into()).collect()),
            Value::Json(j) => j.clone(),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(value_to_json).collect()),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            #[cfg(feature = "datetime-support")]
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        }
    }

    /// How a result column is decoded, keyed by its server type name
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum ColumnKind {
        Bool,
        Int2,
        Int4,
        Int8,
        Float4,
        Float8,
        Json,
        Bytes,
        #[cfg(feature = "uuid-support")]
        Uuid,
        #[cfg(feature = "datetime-support")]
        TimestampTz,
        #[cfg(feature = "datetime-support")]
        Timestamp,
        #[cfg(feature = "datetime-support")]
        Date,
        #[cfg(feature = "decimal-support")]
        Numeric,
        Text,
    }

    impl ColumnKind {
        fn of(type_name: &str) -> Self {
            match type_name {
                "BOOL" => ColumnKind::Bool,
                "INT2" => ColumnKind::Int2,
                "INT4" => ColumnKind::Int4,
                "INT8" => ColumnKind::Int8,
                "FLOAT4" => ColumnKind::Float4,
                "FLOAT8" => ColumnKind::Float8,
                "JSON" | "JSONB" => ColumnKind::Json,
                "BYTEA" => ColumnKind::Bytes,
                #[cfg(feature = "uuid-support")]
                "UUID" => ColumnKind::Uuid,
                #[cfg(feature = "datetime-support")]
                "TIMESTAMPTZ" => ColumnKind::TimestampTz,
                #[cfg(feature = "datetime-support")]
                "TIMESTAMP" => ColumnKind::Timestamp,
                #[cfg(feature = "datetime-support")]
                "DATE" => ColumnKind::Date,
                #[cfg(feature = "decimal-support")]
                "NUMERIC" => ColumnKind::Numeric,
                _ => ColumnKind::Text,
            }
        }
    }

    /// Decode a row into a JSON object keyed by column name.
    ///
    /// Columns the driver cannot decode fail the whole row instead of
    /// turning into `null`.
    fn row_to_json_value(row: &PgRow) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::with_capacity(row.columns().len());
        for (idx, column) in row.columns().iter().enumerate() {
            let value = match ColumnKind::of(column.type_info().name()) {
                ColumnKind::Bool => row.try_get::<Option<bool>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Int2 => row.try_get::<Option<i16>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Int4 => row.try_get::<Option<i32>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Int8 => row.try_get::<Option<i64>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Float4 => row.try_get::<Option<f32>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Float8 => row.try_get::<Option<f64>, _>(idx)?.map(serde_json::Value::from),
                ColumnKind::Json => row.try_get::<Option<serde_json::Value>, _>(idx)?,
                ColumnKind::Bytes => row
                    .try_get::<Option<Vec<u8>>, _>(idx)?
                    .map(serde_json::Value::from),
                #[cfg(feature = "uuid-support")]
                ColumnKind::Uuid => row
                    .try_get::<Option<uuid::Uuid>, _>(idx)?
                    .map(|u| serde_json::Value::String(u.to_string())),
                #[cfg(feature = "datetime-support")]
                ColumnKind::TimestampTz => row
                    .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)?
                    .map(|dt| serde_json::Value::String(dt.to_rfc3339())),
                #[cfg(feature = "datetime-support")]
                ColumnKind::Timestamp => row
                    .try_get::<Option<chrono::NaiveDateTime>, _>(idx)?
                    .map(|dt| serde_json::Value::String(dt.to_string())),
                #[cfg(feature = "datetime-support")]
                ColumnKind::Date => row
                    .try_get::<Option<chrono::NaiveDate>, _>(idx)?
                    .map(|d| serde_json::Value::String(d.to_string())),
                #[cfg(feature = "decimal-support")]
                ColumnKind::Numeric => row
                    .try_get::<Option<rust_decimal::Decimal>, _>(idx)?
                    .map(|d| serde_json::Value::String(d.to_string())),
                ColumnKind::Text => row
                    .try_get::<Option<String>, _>(idx)?
                    .map(serde_json::Value::String),
            };
            object.insert(
                column.name().to_string(),
                value.unwrap_or(serde_json::Value::Null),
            );
        }
        Ok(serde_json::Value::Object(object))
    }

    #[cfg(test)]
    mod postgres_tests {
        use super::*;

        #[test]
        fn test_value_to_json_conversion() {
            assert_eq!(value_to_json(&Value::Null), serde_json::Value::Null);
            assert_eq!(value_to_json(&Value::Bool(true)), serde_json::Value::Bool(true));
            assert_eq!(value_to_json(&Value::I32(42)), serde_json::json!(42));
            assert_eq!(
                value_to_json(&Value::String("test".to_string())),
                serde_json::json!("test")
            );

            let arr = Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
            assert_eq!(value_to_json(&arr), serde_json::json!([1, 2, 3]));
        }

        #[test]
        fn test_parameter_binding_types() {
            let params = vec![
                Value::Null,
                Value::Bool(true),
                Value::I64(123456),
                Value::String("hello".to_string()),
                Value::Bytes(vec![1, 2, 3, 4]),
                Value::Json(serde_json::json!({"key": "value"})),
                Value::Array(vec![Value::I32(1), Value::I32(2)]),
            ];
            let query = sqlx::query("SELECT $1, $2, $3, $4, $5, $6, $7");
            let _bound = bind_values_to_query(query, &params);
        }

        #[test]
        fn test_column_kind_by_type_name() {
            assert_eq!(ColumnKind::of("INT8"), ColumnKind::Int8);
            assert_eq!(ColumnKind::of("JSONB"), ColumnKind::Json);
            assert_eq!(ColumnKind::of("BYTEA"), ColumnKind::Bytes);
            assert_eq!(ColumnKind::of("TEXT"), ColumnKind::Text);
            assert_eq!(ColumnKind::of("VARCHAR"), ColumnKind::Text);
        }

        #[cfg(feature = "all-types")]
        #[test]
        fn test_column_kind_for_optional_types() {
            assert_eq!(ColumnKind::of("UUID"), ColumnKind::Uuid);
            assert_eq!(ColumnKind::of("TIMESTAMPTZ"), ColumnKind::TimestampTz);
            assert_eq!(ColumnKind::of("TIMESTAMP"), ColumnKind::Timestamp);
            assert_eq!(ColumnKind::of("DATE"), ColumnKind::Date);
            assert_eq!(ColumnKind::of("NUMERIC"), ColumnKind::Numeric);
        }

        #[cfg(not(feature = "uuid-support"))]
        #[test]
        fn test_unmapped_types_decode_as_text() {
            // decoded as String, so a mismatch surfaces as an error
            assert_eq!(ColumnKind::of("UUID"), ColumnKind::Text);
        }

        #[tokio::test]
        async fn test_deadline_elapses() {
            let deadline = Instant::now();
            let result: Result<()> = with_deadline(Some(&deadline), async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(())
            })
            .await;
            assert!(matches!(result, Err(Error::Timeout)));
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory executor recording every call

    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub kind: &'static str,
        pub sql: String,
        pub args: Vec<Value>,
        pub ctx: Option<u32>,
    }

    /// Records calls and answers fetches from a canned JSON row set
    #[derive(Default)]
    pub struct MockExecutor {
        pub calls: Mutex<Vec<Call>>,
        pub rows: Vec<serde_json::Value>,
        pub should_fail: bool,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rows(rows: Vec<serde_json::Value>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, kind: &'static str, ctx: Option<&u32>, sql: &str, args: &[Value]) -> Result<()> {
            self.calls.lock().unwrap().push(Call {
                kind,
                sql: sql.to_string(),
                args: args.to_vec(),
                ctx: ctx.copied(),
            });
            if self.should_fail {
                return Err(Error::invalid_query("mock failure"));
            }
            Ok(())
        }
    }

    impl Executor for MockExecutor {
        type Context = u32;

        async fn execute(&self, ctx: Option<&u32>, sql: &str, args: &[Value]) -> Result<ExecResult> {
            self.record("execute", ctx, sql, args)?;
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: Some(42),
            })
        }

        async fn fetch_all<T>(&self, ctx: Option<&u32>, sql: &str, args: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record("fetch_all", ctx, sql, args)?;
            self.rows
                .iter()
                .map(|row| serde_json::from_value(row.clone()).map_err(Error::from))
                .collect()
        }

        async fn fetch_one<T>(&self, ctx: Option<&u32>, sql: &str, args: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record("fetch_one", ctx, sql, args)?;
            let row = self
                .rows
                .first()
                .cloned()
                .ok_or_else(|| Error::invalid_query("no rows"))?;
            Ok(serde_json::from_value(row)?)
        }

        async fn fetch_optional<T>(
            &self,
            ctx: Option<&u32>,
            sql: &str,
            args: &[Value],
        ) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record("fetch_optional", ctx, sql, args)?;
            match self.rows.first() {
                Some(row) => Ok(Some(serde_json::from_value(row.clone())?)),
                None => Ok(None),
            }
        }

        async fn prepare(&self, ctx: Option<&u32>, sql: &str) -> Result<()> {
            self.record("prepare", ctx, sql, &[])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockExecutor;
    use super::*;

    #[tokio::test]
    async fn test_mock_executor_records_calls() {
        let executor = MockExecutor::new();
        let result = executor
            .execute(Some(&7), "DELETE FROM t", &[Value::I32(1)])
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].ctx, Some(7));
        assert_eq!(calls[0].args, vec![Value::I32(1)]);
    }

    #[tokio::test]
    async fn test_default_prepare_accepts() {
        struct Minimal;

        impl Executor for Minimal {
            type Context = ();

            async fn execute(&self, _: Option<&()>, _: &str, _: &[Value]) -> Result<ExecResult> {
                Ok(ExecResult::default())
            }

            async fn fetch_all<T>(&self, _: Option<&()>, _: &str, _: &[Value]) -> Result<Vec<T>>
            where
                T: DeserializeOwned + Send + Unpin,
            {
                Ok(Vec::new())
            }

            async fn fetch_one<T>(&self, _: Option<&()>, _: &str, _: &[Value]) -> Result<T>
            where
                T: DeserializeOwned + Send + Unpin,
            {
                Err(crate::Error::invalid_query("no rows"))
            }

            async fn fetch_optional<T>(&self, _: Option<&()>, _: &str, _: &[Value]) -> Result<Option<T>>
            where
                T: DeserializeOwned + Send + Unpin,
            {
                Ok(None)
            }
        }

        assert!(Minimal.prepare(None, "SELECT 1").await.is_ok());
    }
}
