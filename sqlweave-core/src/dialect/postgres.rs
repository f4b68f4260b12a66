//! PostgreSQL dialect

use super::{upsert_with, Columns, Dialect, Statement};
use crate::{Error, Result};

/// Numbered `$n` placeholders and `ON CONFLICT` upserts
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    /// Requires at least one conflict target column
    fn upsert(&self, table: &str, cols: &Columns, constraints: &[String]) -> Result<Statement> {
        if constraints.is_empty() {
            return Err(Error::invalid_query(
                "postgres upsert requires at least one conflict column",
            ));
        }
        let clause = format!(
            "ON CONFLICT ({}) DO UPDATE SET",
            self.quote_columns(constraints)
        );
        upsert_with(self, table, cols, &clause)
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_table_name(old_name),
            self.quote_table_name(new_name)
        )))
    }

    fn alter_column(&self, table: &str, col: &str, typ: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            self.quote_table_name(table),
            self.quote_column_name(col),
            typ
        )))
    }

    fn drop_index(&self, _table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "DROP INDEX {}",
            self.quote_column_name(name)
        )))
    }
}
