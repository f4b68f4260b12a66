//! Value types for SQL parameters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A SQL value that can be used as a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
    #[cfg(feature = "uuid-support")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "datetime-support")]
    DateTime(chrono::DateTime<chrono::Utc>),
    #[cfg(feature = "decimal-support")]
    Decimal(rust_decimal::Decimal),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// True for `Null` and for the zero value of a numeric kind.
    ///
    /// Model inserts use this to decide whether a primary key should be
    /// left for the database to generate.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::I32(i) => *i == 0,
            Value::I64(i) => *i == 0,
            Value::F32(f) => *f == 0.0,
            Value::F64(f) => *f == 0.0,
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => d.is_zero(),
            _ => false,
        }
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Json(_) => "JSON",
            Value::Array(_) => "ARRAY",
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => "UUID",
            #[cfg(feature = "datetime-support")]
            Value::DateTime(_) => "TIMESTAMPTZ",
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => "NUMERIC",
        }
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Render the value as an inline literal for log output.
    ///
    /// Never used to build executable SQL.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F32(f) => f.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                format!("0x{}", hex)
            }
            Value::Json(j) => format!("'{}'", j.to_string().replace('\'', "''")),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(Value::to_literal).collect();
                format!("[{}]", items.join(", "))
            }
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => format!("'{}'", u),
            #[cfg(feature = "datetime-support")]
            Value::DateTime(dt) => format!("'{}'", dt.to_rfc3339()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => d.to_string(),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(val as i64)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::Uuid(val)
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::DateTime(val)
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Decimal(val)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<&[T]> for Value
where
    T: Clone + Into<Value>,
{
    fn from(vals: &[T]) -> Self {
        Value::Array(vals.iter().cloned().map(|v| v.into()).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Ordered parameter bindings for one render pass.
///
/// Entries keep their insertion position. Re-inserting an existing name
/// replaces the value in place, so generated names stay stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind `value` under `name`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    /// Bind `value` under a generated `p<len>` name and return that name.
    /// If a caller already bound that name, the next free `p<n>` is used.
    pub fn push_auto(&mut self, value: impl Into<Value>) -> String {
        let mut n = self.entries.len();
        let mut name = format!("p{}", n);
        while self.index.contains_key(&name) {
            n += 1;
            name = format!("p{}", n);
        }
        self.insert(name.clone(), value);
        name
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Merge `other` into this set; values from `other` win on conflicts
    pub fn extend(&mut self, other: &Params) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_array_conversion() {
        let value = Value::from(vec![1, 2, 3]);
        assert_eq!(
            value,
            Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)])
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_is_zero() {
        assert!(Value::Null.is_zero());
        assert!(Value::I64(0).is_zero());
        assert!(!Value::I32(7).is_zero());
        assert!(!Value::String(String::new()).is_zero());
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Value::from("I'm").to_literal(), "'I''m'");
        assert_eq!(Value::bytes(vec![0xab, 0x01]).to_literal(), "0xab01");
        assert_eq!(Value::Null.to_literal(), "NULL");
    }

    #[test]
    fn test_params_auto_names_follow_length() {
        let mut params = Params::new();
        params.insert("k0", 1);
        assert_eq!(params.push_auto("a"), "p1");
        assert_eq!(params.push_auto("b"), "p2");
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("p2"), Some(&Value::from("b")));
    }

    #[test]
    fn test_push_auto_skips_caller_names() {
        let mut params = Params::new().with("p1", "mine");
        assert_eq!(params.push_auto(7), "p2");
        assert_eq!(params.get("p1"), Some(&Value::from("mine")));
        assert_eq!(params.get("p2"), Some(&Value::I32(7)));
    }

    #[test]
    fn test_params_overwrite_keeps_position() {
        let mut params: Params = vec![("a", 1), ("b", 2)].into_iter().collect();
        params.insert("a", 10);
        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(params.get("a"), Some(&Value::I32(10)));
    }

    #[test]
    fn test_params_extend() {
        let mut params = Params::new().with("a", 1);
        params.extend(&Params::new().with("a", 2).with("b", 3));
        assert_eq!(params.get("a"), Some(&Value::I32(2)));
        assert_eq!(params.len(), 2);
    }
}
