//! SQL Server dialect

use super::{Dialect, Statement};
use crate::Result;

/// Bracketed identifiers and `OFFSET`/`FETCH` pagination (SQL Server 2012+)
#[derive(Debug, Clone, Copy, Default)]
pub struct MsSql;

impl Dialect for MsSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_simple_table_name(&self, s: &str) -> String {
        if s.contains('[') {
            return s.to_string();
        }
        format!("[{}]", s)
    }

    fn quote_simple_column_name(&self, s: &str) -> String {
        if s.contains('[') || s == "*" {
            return s.to_string();
        }
        format!("[{}]", s)
    }

    /// `OFFSET`/`FETCH` needs an `ORDER BY`, so one is synthesized when
    /// pagination is requested without an ordering.
    fn build_order_by_and_limit(
        &self,
        sql: String,
        cols: &[String],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> String {
        let mut order_by = self.build_order_by(cols);
        if limit.is_none() && offset.is_none() {
            if order_by.is_empty() {
                return sql;
            }
            return format!("{} {}", sql, order_by);
        }

        if order_by.is_empty() {
            order_by = "ORDER BY (SELECT NULL)".to_string();
        }
        let mut sql = format!("{} {} OFFSET {} ROWS", sql, order_by, offset.unwrap_or(0));
        if let Some(limit) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        sql
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "sp_rename {}, {}",
            self.quote(old_name),
            self.quote(new_name)
        )))
    }

    fn rename_column(&self, table: &str, old_name: &str, new_name: &str) -> Result<Statement> {
        Ok(Statement::new(format!(
            "sp_rename {}, {}, 'COLUMN'",
            self.quote(&format!("{}.{}", table, old_name)),
            self.quote(new_name)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quoting() {
        assert_eq!(MsSql.quote_table_name("dbo.users"), "[dbo].[users]");
        assert_eq!(MsSql.quote_column_name("[id]"), "[id]");
        assert_eq!(MsSql.quote_column_name("u.*"), "[u].*");
    }

    #[test]
    fn test_pagination_synthesizes_order_by() {
        let sql = MsSql.build_order_by_and_limit("SELECT *".to_string(), &[], Some(10), Some(2));
        assert_eq!(
            sql,
            "SELECT * ORDER BY (SELECT NULL) OFFSET 2 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_pagination_variants() {
        let cols = vec!["id DESC".to_string()];
        assert_eq!(
            MsSql.build_order_by_and_limit("SELECT *".to_string(), &cols, Some(10), None),
            "SELECT * ORDER BY [id] DESC OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            MsSql.build_order_by_and_limit("SELECT *".to_string(), &[], None, Some(5)),
            "SELECT * ORDER BY (SELECT NULL) OFFSET 5 ROWS"
        );
        assert_eq!(
            MsSql.build_order_by_and_limit("SELECT *".to_string(), &cols, None, None),
            "SELECT * ORDER BY [id] DESC"
        );
        assert_eq!(
            MsSql.build_order_by_and_limit("SELECT *".to_string(), &[], None, None),
            "SELECT *"
        );
    }

    #[test]
    fn test_ddl_overrides() {
        assert_eq!(
            MsSql.rename_table("users", "user").unwrap().sql,
            "sp_rename 'users', 'user'"
        );
        assert_eq!(
            MsSql.rename_column("users", "name", "username").unwrap().sql,
            "sp_rename 'users.name', 'username', 'COLUMN'"
        );
        assert_eq!(
            MsSql.alter_column("users", "name", "int").unwrap().sql,
            "ALTER TABLE [users] ALTER COLUMN [name] int"
        );
    }
}
