//! Insert, update and delete statements derived from records

use crate::dialect::Columns;
use crate::expression::Operand;
use crate::mapping::{short_type_name, ColumnMapping, Record};
use crate::{Db, Error, Expr, Query, Result, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Statements for one record value.
///
/// Created through [`Db::model`]. Columns come from the record's cached
/// [`ColumnMapping`]; attribute names are logical field names.
pub struct ModelQuery<'a, T: Record> {
    db: &'a Db,
    record: &'a T,
    mapping: Arc<ColumnMapping<T>>,
    exclude: Vec<String>,
}

impl<'a, T: Record> ModelQuery<'a, T> {
    pub(crate) fn new(db: &'a Db, record: &'a T, mapping: Arc<ColumnMapping<T>>) -> Self {
        Self {
            db,
            record,
            mapping,
            exclude: Vec::new(),
        }
    }

    /// Leave the named fields out of every statement built afterwards
    pub fn exclude<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn mapping(&self) -> &ColumnMapping<T> {
        &self.mapping
    }

    /// `INSERT` the record's columns, or only `attrs` when given.
    ///
    /// A single primary key holding a zero or null value is left for the
    /// database to generate.
    pub fn insert(&self, attrs: &[&str]) -> Result<Query> {
        let mut values = self.values(attrs)?;
        if let [pk] = self.mapping.pk_db_names().as_slice() {
            if values.get(*pk).is_some_and(Value::is_zero) {
                values.remove(*pk);
            }
        }
        let stmt = self.db.dialect().insert(&T::table_name(), &to_columns(values))?;
        Ok(self.db.statement_query(stmt))
    }

    /// `UPDATE` the non-key columns, filtered by the primary key
    pub fn update(&self, attrs: &[&str]) -> Result<Query> {
        let mut values = self.values(attrs)?;
        let pk = self.pk_values()?;
        for name in pk.keys() {
            values.remove(name);
        }
        if values.is_empty() {
            return Err(Error::invalid_query(format!(
                "no columns to update for '{}'",
                short_type_name::<T>()
            )));
        }
        let filter = Expr::hash(pk);
        let stmt = self
            .db
            .dialect()
            .update(&T::table_name(), &to_columns(values), Some(&filter))?;
        Ok(self.db.statement_query(stmt))
    }

    /// `DELETE` the row matching the primary key
    pub fn delete(&self) -> Result<Query> {
        self.ensure_record()?;
        let filter = Expr::hash(self.pk_values()?);
        let stmt = self.db.dialect().delete(&T::table_name(), Some(&filter))?;
        Ok(self.db.statement_query(stmt))
    }

    fn ensure_record(&self) -> Result<()> {
        if self.mapping.is_empty() {
            return Err(Error::not_a_record(short_type_name::<T>()));
        }
        Ok(())
    }

    fn values(&self, attrs: &[&str]) -> Result<BTreeMap<String, Value>> {
        self.ensure_record()?;
        let exclude: Vec<&str> = self.exclude.iter().map(String::as_str).collect();
        Ok(self.mapping.values(self.record, attrs, &exclude))
    }

    fn pk_values(&self) -> Result<BTreeMap<String, Value>> {
        let pk = self.mapping.pk_values(self.record);
        if pk.is_empty() {
            return Err(Error::missing_primary_key(short_type_name::<T>()));
        }
        Ok(pk)
    }
}

fn to_columns(values: BTreeMap<String, Value>) -> Columns {
    values
        .into_iter()
        .map(|(name, value)| (name, Operand::Value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Standard};
    use crate::mapping::Field;
    use crate::Params;
    use pretty_assertions::assert_eq;

    struct User {
        id: i64,
        name: String,
        age: i32,
    }

    impl Record for User {
        fn table_name() -> String {
            "users".to_string()
        }

        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::new("ID", |u: &User| u.id.into()),
                Field::new("Name", |u: &User| u.name.clone().into()),
                Field::new("Age", |u: &User| u.age.into()),
            ]
        }
    }

    struct OrderItem {
        order_id: i64,
        product_id: i64,
        quantity: i32,
    }

    impl Record for OrderItem {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::new("OrderID", |i: &OrderItem| i.order_id.into()).tag("pk"),
                Field::new("ProductID", |i: &OrderItem| i.product_id.into()).tag("pk"),
                Field::new("Quantity", |i: &OrderItem| i.quantity.into()),
            ]
        }
    }

    struct Event {
        kind: String,
    }

    impl Record for Event {
        fn fields() -> Vec<Field<Self>> {
            vec![Field::new("Kind", |e: &Event| e.kind.clone().into())]
        }
    }

    struct Opaque;

    impl Record for Opaque {}

    fn james(id: i64) -> User {
        User {
            id,
            name: "James".to_string(),
            age: 30,
        }
    }

    #[test]
    fn test_insert_drops_zero_primary_key() {
        let db = Db::with_dialect(Arc::new(Standard));
        let q = db.model(&james(0)).insert(&[]).unwrap();
        assert_eq!(q.sql(), r#"INSERT INTO "users" ("age", "name") VALUES ({:p0}, {:p1})"#);
        assert_eq!(
            q.params(),
            &Params::new().with("p0", 30).with("p1", "James")
        );
    }

    #[test]
    fn test_insert_keeps_supplied_primary_key() {
        let db = Db::with_dialect(Arc::new(MySql));
        let q = db.model(&james(5)).insert(&[]).unwrap();
        assert_eq!(q.raw_sql(), "INSERT INTO `users` (`age`, `id`, `name`) VALUES (?, ?, ?)");
        assert_eq!(
            q.args().unwrap(),
            vec![Value::I32(30), Value::I64(5), Value::from("James")]
        );
    }

    #[test]
    fn test_insert_selected_attributes() {
        let db = Db::with_dialect(Arc::new(Standard));
        let q = db.model(&james(0)).insert(&["Name"]).unwrap();
        assert_eq!(q.sql(), r#"INSERT INTO "users" ("name") VALUES ({:p0})"#);
    }

    #[test]
    fn test_composite_key_values_are_inserted() {
        let db = Db::with_dialect(Arc::new(Standard));
        let item = OrderItem {
            order_id: 0,
            product_id: 3,
            quantity: 2,
        };
        let q = db.model(&item).insert(&[]).unwrap();
        assert_eq!(
            q.sql(),
            r#"INSERT INTO "order_item" ("order_id", "product_id", "quantity") VALUES ({:p0}, {:p1}, {:p2})"#
        );
    }

    #[test]
    fn test_update_filters_by_primary_key() {
        let db = Db::with_dialect(Arc::new(Standard));
        let q = db.model(&james(7)).update(&[]).unwrap();
        assert_eq!(
            q.sql(),
            r#"UPDATE "users" SET "age"={:p0}, "name"={:p1} WHERE "id"={:p2}"#
        );
        assert_eq!(q.params().get("p2"), Some(&Value::I64(7)));
    }

    #[test]
    fn test_update_with_exclusions() {
        let db = Db::with_dialect(Arc::new(Standard));
        let q = db.model(&james(7)).exclude(["Age"]).update(&[]).unwrap();
        assert_eq!(q.sql(), r#"UPDATE "users" SET "name"={:p0} WHERE "id"={:p1}"#);
    }

    #[test]
    fn test_update_without_set_columns() {
        let db = Db::with_dialect(Arc::new(Standard));
        match db.model(&james(7)).update(&["ID"]) {
            Err(Error::InvalidQuery { message }) => {
                assert_eq!(message, "no columns to update for 'User'")
            }
            other => panic!("unexpected result: {:?}", other.map(|q| q.sql().to_string())),
        }
        assert!(matches!(
            db.model(&james(7)).exclude(["Name", "Age"]).update(&[]),
            Err(Error::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_delete_by_composite_key() {
        let db = Db::with_dialect(Arc::new(Standard));
        let item = OrderItem {
            order_id: 1,
            product_id: 3,
            quantity: 2,
        };
        let q = db.model(&item).delete().unwrap();
        assert_eq!(
            q.sql(),
            r#"DELETE FROM "order_item" WHERE "order_id"={:p0} AND "product_id"={:p1}"#
        );
    }

    #[test]
    fn test_missing_primary_key() {
        let db = Db::with_dialect(Arc::new(Standard));
        let event = Event {
            kind: "login".to_string(),
        };
        assert!(db.model(&event).insert(&[]).is_ok());
        assert!(matches!(
            db.model(&event).update(&[]),
            Err(Error::MissingPrimaryKey { .. })
        ));
        assert!(matches!(
            db.model(&event).delete(),
            Err(Error::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_not_a_record() {
        let db = Db::with_dialect(Arc::new(Standard));
        match db.model(&Opaque).insert(&[]) {
            Err(Error::NotARecord { type_name }) => assert_eq!(type_name, "Opaque"),
            other => panic!("unexpected result: {:?}", other.map(|q| q.sql().to_string())),
        }
        assert!(matches!(db.model(&Opaque).delete(), Err(Error::NotARecord { .. })));
    }
}
