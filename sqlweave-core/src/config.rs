//! Facade configuration

use crate::mapping::{default_field_mapper, identity_field_mapper, FieldMapper};
use serde::{Deserialize, Serialize};

/// Naming policy from logical field names to column names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMapping {
    /// `FirstName` -> `first_name`
    #[default]
    SnakeCase,
    /// Field names are used as column names unchanged
    Identity,
}

impl FieldMapping {
    pub fn mapper(self) -> FieldMapper {
        match self {
            FieldMapping::SnakeCase => default_field_mapper,
            FieldMapping::Identity => identity_field_mapper,
        }
    }
}

/// Settings for building a [`Db`](crate::Db)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Driver name looked up in the dialect registry
    pub driver: String,
    #[serde(default)]
    pub field_mapping: FieldMapping,
}

impl DbConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            field_mapping: FieldMapping::default(),
        }
    }

    pub fn with_field_mapping(mut self, field_mapping: FieldMapping) -> Self {
        self.field_mapping = field_mapping;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: DbConfig = serde_json::from_str(r#"{"driver": "postgres"}"#).unwrap();
        assert_eq!(config, DbConfig::new("postgres"));
        assert_eq!(config.field_mapping, FieldMapping::SnakeCase);
    }

    #[test]
    fn test_deserialize_identity_mapping() {
        let config: DbConfig =
            serde_json::from_str(r#"{"driver": "mysql", "field_mapping": "identity"}"#).unwrap();
        assert_eq!(config.field_mapping, FieldMapping::Identity);
        assert_eq!((config.field_mapping.mapper())("FirstName"), "FirstName");
    }

    #[test]
    fn test_serialize_round_trip_names() {
        let config = DbConfig::new("sqlite").with_field_mapping(FieldMapping::SnakeCase);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"driver": "sqlite", "field_mapping": "snake_case"})
        );
    }

    #[test]
    fn test_unknown_mapping_is_rejected() {
        let result: Result<DbConfig, _> =
            serde_json::from_str(r#"{"driver": "mysql", "field_mapping": "kebab"}"#);
        assert!(result.is_err());
    }
}
