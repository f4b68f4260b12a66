//! Record to column mapping
//!
//! Records describe their fields explicitly through [`Record::fields`]. Each
//! [`Field`] carries a logical name, an optional tag and either a value
//! accessor or the expanded fields of a nested record. Tags follow this
//! grammar:
//!
//! - `-` excludes the field
//! - `name` sets the column name
//! - `pk` marks a primary key and keeps the mapped column name
//! - `pk,name` marks a primary key with column name `name`
//!
//! Named nested fields prefix their children's logical names and column
//! names with `.`; embedded fields contribute no name segment of their own.
//! When a logical name is reachable through several paths the shallowest one
//! wins, and among equally deep candidates the first declared wins.
//!
//! Resolved mappings are cached per `(record type, field mapper)` for the
//! lifetime of the process.
//!
//! # Examples
//!
//! ```
//! use sqlweave_core::mapping::{column_mapping, default_field_mapper, Field, Record};
//!
//! struct User {
//!     id: i64,
//!     first_name: String,
//! }
//!
//! impl Record for User {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::new("ID", |u: &User| u.id.into()),
//!             Field::new("FirstName", |u: &User| u.first_name.clone().into()),
//!         ]
//!     }
//! }
//!
//! let mapping = column_mapping::<User>(default_field_mapper);
//! assert_eq!(mapping.pk_names(), ["ID"]);
//! assert_eq!(mapping.by_name("FirstName").unwrap().db_name(), "first_name");
//! ```

use crate::Value;
use regex::Regex;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// Maps a logical field name to its default column name
pub type FieldMapper = fn(&str) -> String;

type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// `FirstName` -> `first_name`, `UserID` -> `user_id`, `MyURLPath` -> `my_urlpath`
pub fn default_field_mapper(name: &str) -> String {
    static CAMEL_RE: OnceLock<Regex> = OnceLock::new();
    let re = CAMEL_RE
        .get_or_init(|| Regex::new("([^A-Z_])([A-Z])").expect("invalid built-in field regex"));
    re.replace_all(name, "${1}_$2").to_lowercase()
}

/// Uses the logical name unchanged
pub fn identity_field_mapper(name: &str) -> String {
    name.to_string()
}

/// A type whose values map to table rows
pub trait Record: Sized + Send + Sync + 'static {
    /// Table the record is stored in.
    /// Defaults to the mapped type name, so `MyCustomer` is stored in `my_customer`.
    fn table_name() -> String {
        default_field_mapper(short_type_name::<Self>())
    }

    /// Field descriptors in declaration order
    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }

    /// Whether the type is read and written as one opaque value.
    /// Nested fields of such a type are columns rather than expanded records.
    fn scans_as_value() -> bool {
        false
    }

    /// The single value for types that scan as one value
    fn scan_value(&self) -> Value {
        Value::Null
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

enum FieldKind<T> {
    Column(Accessor<T>),
    Nested(Vec<Field<T>>),
}

/// Describes one field of a record
pub struct Field<T> {
    name: String,
    tag: Option<String>,
    embedded: bool,
    kind: FieldKind<T>,
}

impl<T: 'static> Field<T> {
    /// A terminal field read through `get`
    pub fn new<F>(name: impl Into<String>, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tag: None,
            embedded: false,
            kind: FieldKind::Column(Arc::new(get)),
        }
    }

    /// A named nested record; its fields are prefixed with this field's name
    pub fn nested<A: Record>(name: impl Into<String>, get: fn(&T) -> &A) -> Self {
        Self::project(
            name.into(),
            false,
            move |t: &T, acc: &Accessor<A>| acc(get(t)),
            move |t: &T| get(t).scan_value(),
        )
    }

    /// A named nested record that may be absent; absent values read as `Null`
    pub fn nested_opt<A: Record>(name: impl Into<String>, get: fn(&T) -> Option<&A>) -> Self {
        Self::project(
            name.into(),
            false,
            move |t: &T, acc: &Accessor<A>| get(t).map_or(Value::Null, |a| acc(a)),
            move |t: &T| get(t).map_or(Value::Null, A::scan_value),
        )
    }

    /// An embedded record whose fields appear without a name prefix
    pub fn embedded<A: Record>(get: fn(&T) -> &A) -> Self {
        let mut field = Self::nested(short_type_name::<A>(), get);
        field.embedded = true;
        field
    }

    pub fn embedded_opt<A: Record>(get: fn(&T) -> Option<&A>) -> Self {
        let mut field = Self::nested_opt(short_type_name::<A>(), get);
        field.embedded = true;
        field
    }

    /// Attach a tag: `-`, `name`, `pk` or `pk,name`
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn project<A, P, S>(name: String, embedded: bool, through: P, scan: S) -> Self
    where
        A: Record,
        P: Fn(&T, &Accessor<A>) -> Value + Clone + Send + Sync + 'static,
        S: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let kind = if A::scans_as_value() {
            FieldKind::Column(Arc::new(scan))
        } else {
            let children = A::fields()
                .into_iter()
                .map(|child| child.lift(&through))
                .collect();
            FieldKind::Nested(children)
        };
        Self {
            name,
            tag: None,
            embedded,
            kind,
        }
    }
}

impl<A: 'static> Field<A> {
    /// Re-root this field onto an outer record type
    fn lift<T, P>(self, through: &P) -> Field<T>
    where
        T: 'static,
        P: Fn(&T, &Accessor<A>) -> Value + Clone + Send + Sync + 'static,
    {
        let kind = match self.kind {
            FieldKind::Column(acc) => {
                let through = through.clone();
                FieldKind::Column(Arc::new(move |t: &T| through(t, &acc)))
            }
            FieldKind::Nested(children) => {
                FieldKind::Nested(children.into_iter().map(|c| c.lift(through)).collect())
            }
        };
        Field {
            name: self.name,
            tag: self.tag,
            embedded: self.embedded,
            kind,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Field");
        s.field("name", &self.name)
            .field("tag", &self.tag)
            .field("embedded", &self.embedded);
        if let FieldKind::Nested(children) = &self.kind {
            s.field("children", children);
        }
        s.finish()
    }
}

/// A resolved column of a record type
pub struct ColumnInfo<T> {
    name: String,
    db_name: String,
    is_pk: bool,
    depth: usize,
    accessor: Accessor<T>,
}

impl<T> ColumnInfo<T> {
    /// Logical field path, e.g. `Address.City`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_pk
    }

    pub fn value(&self, record: &T) -> Value {
        (self.accessor)(record)
    }
}

impl<T> fmt::Debug for ColumnInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnInfo")
            .field("name", &self.name)
            .field("db_name", &self.db_name)
            .field("is_pk", &self.is_pk)
            .field("depth", &self.depth)
            .finish()
    }
}

/// The resolved field-path to column table for one record type
pub struct ColumnMapping<T> {
    columns: Vec<ColumnInfo<T>>,
    name_map: HashMap<String, usize>,
    db_name_map: HashMap<String, usize>,
    pk_names: Vec<String>,
}

impl<T: Record> ColumnMapping<T> {
    /// Resolve `T`'s fields without consulting the cache
    pub fn build(mapper: FieldMapper) -> Self {
        let mut candidates = Vec::new();
        collect(&T::fields(), mapper, "", "", 1, &mut candidates);

        // shallowest path wins, first declared breaks ties
        let mut winners: HashMap<String, usize> = HashMap::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            match winners.get(&candidate.name) {
                Some(&prev) if candidates[prev].depth <= candidate.depth => {}
                _ => {
                    winners.insert(candidate.name.clone(), idx);
                }
            }
        }

        let columns: Vec<ColumnInfo<T>> = candidates
            .into_iter()
            .enumerate()
            .filter(|(idx, c)| winners.get(&c.name) == Some(idx))
            .map(|(_, c)| c)
            .collect();

        let mut name_map = HashMap::with_capacity(columns.len());
        let mut db_name_map = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            name_map.insert(column.name.clone(), idx);
            db_name_map.entry(column.db_name.clone()).or_insert(idx);
        }

        let mut pk_names: Vec<String> = columns
            .iter()
            .filter(|c| c.is_pk)
            .map(|c| c.name.clone())
            .collect();
        if pk_names.is_empty() && name_map.contains_key("ID") {
            pk_names.push("ID".to_string());
        }

        Self {
            columns,
            name_map,
            db_name_map,
            pk_names,
        }
    }
}

impl<T> ColumnMapping<T> {
    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnInfo<T>] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&ColumnInfo<T>> {
        self.name_map.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn by_db_name(&self, db_name: &str) -> Option<&ColumnInfo<T>> {
        self.db_name_map.get(db_name).map(|&idx| &self.columns[idx])
    }

    /// Logical names of the primary key fields
    pub fn pk_names(&self) -> &[String] {
        &self.pk_names
    }

    /// Column values keyed by column name.
    ///
    /// An empty `include` selects every column; names in `exclude` are
    /// removed afterwards. Unknown names are ignored.
    pub fn values(&self, record: &T, include: &[&str], exclude: &[&str]) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        if include.is_empty() {
            for column in &self.columns {
                values.insert(column.db_name.clone(), column.value(record));
            }
        } else {
            for column in include.iter().filter_map(|name| self.by_name(name)) {
                values.insert(column.db_name.clone(), column.value(record));
            }
        }
        for column in exclude.iter().filter_map(|name| self.by_name(name)) {
            values.remove(&column.db_name);
        }
        values
    }

    /// Primary key values keyed by column name
    pub fn pk_values(&self, record: &T) -> BTreeMap<String, Value> {
        self.pk_names
            .iter()
            .filter_map(|name| self.by_name(name))
            .map(|column| (column.db_name.clone(), column.value(record)))
            .collect()
    }

    /// Column names of the primary key fields
    pub fn pk_db_names(&self) -> Vec<&str> {
        self.pk_names
            .iter()
            .filter_map(|name| self.by_name(name))
            .map(|column| column.db_name())
            .collect()
    }
}

impl<T> fmt::Debug for ColumnMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMapping")
            .field("columns", &self.columns)
            .field("pk_names", &self.pk_names)
            .finish()
    }
}

fn parse_tag(tag: &str) -> (&str, bool) {
    if tag == "pk" {
        return ("", true);
    }
    match tag.strip_prefix("pk,") {
        Some(name) => (name, true),
        None => (tag, false),
    }
}

fn concat(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, name),
    }
}

fn collect<T>(
    fields: &[Field<T>],
    mapper: FieldMapper,
    name_prefix: &str,
    db_prefix: &str,
    depth: usize,
    out: &mut Vec<ColumnInfo<T>>,
) {
    for field in fields {
        let tag = field.tag.as_deref().unwrap_or("");
        if tag == "-" {
            continue;
        }

        let (tagged, is_pk) = parse_tag(tag);
        let db_name = if tagged.is_empty() && !field.embedded {
            mapper(&field.name)
        } else {
            tagged.to_string()
        };
        let name = if field.embedded { "" } else { field.name.as_str() };

        match &field.kind {
            FieldKind::Nested(children) => collect(
                children,
                mapper,
                &concat(name_prefix, name),
                &concat(db_prefix, &db_name),
                depth + 1,
                out,
            ),
            // an embedded single-value field needs an explicit column name
            FieldKind::Column(_) if db_name.is_empty() => {}
            FieldKind::Column(accessor) => out.push(ColumnInfo {
                name: concat(name_prefix, name),
                db_name: concat(db_prefix, &db_name),
                is_pk,
                depth,
                accessor: Arc::clone(accessor),
            }),
        }
    }
}

type CacheKey = (TypeId, usize);

fn mapping_cache() -> &'static Mutex<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>> {
    static CACHE: OnceLock<Mutex<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The cached mapping of `T` under `mapper`, built on first use.
///
/// Concurrent first calls for the same key build exactly once.
pub fn column_mapping<T: Record>(mapper: FieldMapper) -> Arc<ColumnMapping<T>> {
    let key = (TypeId::of::<T>(), mapper as usize);
    let mut cache = mapping_cache()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(found) = cache.get(&key) {
        if let Ok(mapping) = Arc::clone(found).downcast::<ColumnMapping<T>>() {
            return mapping;
        }
    }

    let mapping = Arc::new(ColumnMapping::<T>::build(mapper));
    cache.insert(key, mapping.clone());
    mapping
}
