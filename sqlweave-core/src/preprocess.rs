//! Raw SQL template rewriting
//!
//! Templates may contain `{:name}` parameter placeholders, `{{table}}` table
//! markers and `[[column]]` column markers. Placeholders are replaced first,
//! each occurrence receiving the dialect's placeholder for its position;
//! identifier markers are quoted afterwards.

use crate::dialect::Dialect;
use regex::{Captures, Regex};
use std::sync::OnceLock;

pub(crate) fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{:([A-Za-z0-9_]+)\}").expect("invalid built-in placeholder regex")
    })
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER_RE.get_or_init(|| {
        Regex::new(r"\{\{([A-Za-z0-9_\-. ]+)\}\}|\[\[([A-Za-z0-9_\-. *]+)\]\]")
            .expect("invalid built-in identifier regex")
    })
}

/// Rewrite `sql` for `dialect`.
///
/// Returns the literal SQL and the placeholder names in occurrence order.
/// A name used twice appears twice.
///
/// # Examples
///
/// ```
/// use sqlweave_core::{dialect::Postgres, preprocess::process_sql};
///
/// let (sql, names) = process_sql(&Postgres, "SELECT * FROM {{users}} WHERE [[id]]={:id}");
/// assert_eq!(sql, r#"SELECT * FROM "users" WHERE "id"=$1"#);
/// assert_eq!(names, vec!["id"]);
/// ```
pub fn process_sql(dialect: &dyn Dialect, sql: &str) -> (String, Vec<String>) {
    let mut names = Vec::new();
    let sql = placeholder_regex().replace_all(sql, |caps: &Captures| {
        names.push(caps[1].to_string());
        dialect.placeholder(names.len())
    });

    let sql = identifier_regex().replace_all(&sql, |caps: &Captures| {
        match (caps.get(1), caps.get(2)) {
            (Some(table), _) => dialect.quote_table_name(table.as_str()),
            (None, Some(column)) => dialect.quote_column_name(column.as_str()),
            (None, None) => caps[0].to_string(),
        }
    });

    (sql.into_owned(), names)
}
