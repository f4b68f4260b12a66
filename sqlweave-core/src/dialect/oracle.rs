//! Oracle dialect

use super::{Dialect, Statement};
use crate::Result;

/// Named `:pN` placeholders and row-number based pagination
#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

impl Dialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":p{}", index)
    }

    /// Wraps the query in a derived table numbering each row, then filters
    /// on that number. The selected columns are kept.
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

        let mut conditions = Vec::with_capacity(2);
        if let Some(offset) = offset.filter(|&o| o > 0) {
            conditions.push(format!("rowNumId > {}", offset));
        }
        if let Some(limit) = limit {
            conditions.push(format!("rowNum <= {}", limit));
        }
        if conditions.is_empty() {
            return sql;
        }

        format!(
            "WITH USER_SQL AS ({}), PAGINATION AS (SELECT USER_SQL.*, rownum as rowNumId FROM USER_SQL) SELECT * FROM PAGINATION WHERE {}",
            sql,
            conditions.join(" AND ")
        )
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
            "ALTER TABLE {} MODIFY {} {}",
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
