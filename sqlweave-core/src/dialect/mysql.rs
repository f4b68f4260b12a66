//! MySQL / MariaDB dialect

use super::{upsert_with, Columns, Dialect, Statement};
use crate::Result;

/// Backtick identifiers and `ON DUPLICATE KEY UPDATE` upserts
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_simple_table_name(&self, s: &str) -> String {
        if s.contains('`') {
            return s.to_string();
        }
        format!("`{}`", s)
    }

    fn quote_simple_column_name(&self, s: &str) -> String {
        if s.contains('`') || s == "*" {
            return s.to_string();
        }
        format!("`{}`", s)
    }

    fn insert_default_values(&self, table: &str) -> String {
        format!("INSERT INTO {} () VALUES ()", self.quote_table_name(table))
    }

    /// The update branch repeats every inserted column. Constraints are
    /// implied by the table's unique keys and are not rendered.
    fn upsert(&self, table: &str, cols: &Columns, _constraints: &[String]) -> Result<Statement> {
        upsert_with(self, table, cols, "ON DUPLICATE KEY UPDATE")
    }

    fn drop_primary_key(&self, table: &str, _name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP PRIMARY KEY",
            self.quote_table_name(table)
        )))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_table_name(table),
            self.quote_column_name(name)
        )))
    }
}
