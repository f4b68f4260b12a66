//! SQLite dialect

use super::{Dialect, ForeignKey, Statement};
use crate::{Error, Result};

/// Backtick identifiers. `ALTER TABLE` support is limited to adding
/// columns and renaming tables, so other column and key changes fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
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

    fn drop_index(&self, _table: &str, name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "DROP INDEX {}",
            self.quote_column_name(name)
        )))
    }

    fn truncate_table(&self, table: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "DELETE FROM {}",
            self.quote_table_name(table)
        )))
    }

    fn drop_column(&self, _table: &str, _col: &str) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "DROP COLUMN"))
    }

    fn rename_column(&self, _table: &str, _old: &str, _new: &str) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "RENAME COLUMN"))
    }

    fn alter_column(&self, _table: &str, _col: &str, _typ: &str) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "ALTER COLUMN"))
    }

    fn add_primary_key(&self, _table: &str, _name: &str, _cols: &[String]) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "ADD PRIMARY KEY"))
    }

    fn drop_primary_key(&self, _table: &str, _name: &str) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "DROP PRIMARY KEY"))
    }

    fn add_foreign_key(&self, _table: &str, _fk: &ForeignKey) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "ADD FOREIGN KEY"))
    }

    fn drop_foreign_key(&self, _table: &str, _name: &str) -> Result<Statement> {
        Err(Error::unsupported(self.name(), "DROP FOREIGN KEY"))
    }
}
