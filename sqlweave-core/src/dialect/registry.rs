//! Driver name to dialect lookup

use super::{Dialect, MsSql, MySql, Oracle, Postgres, Sqlite, Standard};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructs the dialect for one driver
pub type DialectFactory = fn() -> Arc<dyn Dialect>;

/// Maps database driver names to dialect factories.
///
/// Build one at startup and pass it to [`Db::new`](crate::Db::new).
/// Unknown driver names resolve to [`Standard`].
///
/// # Examples
///
/// ```
/// use sqlweave_core::dialect::DialectRegistry;
///
/// let registry = DialectRegistry::default();
/// assert_eq!(registry.resolve("pgx").name(), "postgres");
/// assert_eq!(registry.resolve("unknown").name(), "standard");
/// ```
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    factories: HashMap<String, DialectFactory>,
}

impl DialectRegistry {
    /// A registry with no drivers; every lookup yields [`Standard`]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register or replace the factory for `driver`
    pub fn register(&mut self, driver: impl Into<String>, factory: DialectFactory) -> &mut Self {
        self.factories.insert(driver.into(), factory);
        self
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.factories.contains_key(driver)
    }

    pub fn resolve(&self, driver: &str) -> Arc<dyn Dialect> {
        match self.factories.get(driver) {
            Some(factory) => factory(),
            None => {
                tracing::debug!(driver, "no dialect registered for driver, using standard");
                Arc::new(Standard)
            }
        }
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("sqlite", || Arc::new(Sqlite))
            .register("sqlite3", || Arc::new(Sqlite))
            .register("mysql", || Arc::new(MySql))
            .register("postgres", || Arc::new(Postgres))
            .register("pgx", || Arc::new(Postgres))
            .register("mssql", || Arc::new(MsSql))
            .register("sqlserver", || Arc::new(MsSql))
            .register("oci8", || Arc::new(Oracle))
            .register("oracle", || Arc::new(Oracle));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_drivers() {
        let registry = DialectRegistry::default();
        assert_eq!(registry.resolve("sqlite3").name(), "sqlite");
        assert_eq!(registry.resolve("mysql").name(), "mysql");
        assert_eq!(registry.resolve("postgres").name(), "postgres");
        assert_eq!(registry.resolve("mssql").name(), "mssql");
        assert_eq!(registry.resolve("oci8").name(), "oracle");
    }

    #[test]
    fn test_unknown_driver_falls_back_to_standard() {
        let registry = DialectRegistry::default();
        assert!(!registry.contains("firebird"));
        assert_eq!(registry.resolve("firebird").name(), "standard");
        assert_eq!(DialectRegistry::empty().resolve("mysql").name(), "standard");
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = DialectRegistry::empty();
        registry.register("tidb", || Arc::new(MySql));
        assert_eq!(registry.resolve("tidb").quote_simple_table_name("t"), "`t`");
    }
}
