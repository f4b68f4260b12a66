//! Sqlweave Core - dialect-aware SQL statement rendering
//!
//! This crate renders SELECT, INSERT, UPDATE, DELETE and DDL statements for
//! several database dialects from composable expressions and explicitly
//! described records. Rendered [`Query`] values carry the dialect SQL and
//! their ordered arguments, and run on any [`Executor`].

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expression;
pub mod mapping;
pub mod model;
pub mod preprocess;
pub mod query;
pub mod select;
pub mod value;

// Re-export main types
pub use config::{DbConfig, FieldMapping};
pub use db::Db;
pub use dialect::{columns, Columns, Dialect, DialectRegistry, ForeignKey, Statement};
pub use error::{Error, Result};
pub use executor::{ExecResult, Executor};
pub use expression::{Expr, Expression, LikeExp, Operand};
pub use mapping::{Field, Record};
pub use model::ModelQuery;
pub use query::Query;
pub use select::SelectQuery;
pub use value::{Params, Value};

#[cfg(feature = "postgres")]
pub use executor::postgres::PostgresPool;
