use pretty_assertions::assert_eq;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlweave_core::dialect::{DialectRegistry, MsSql, MySql, Standard};
use sqlweave_core::mapping::{column_mapping, default_field_mapper};
use sqlweave_core::{
    columns, Db, DbConfig, Error, ExecResult, Executor, Expr, Field, Params, Query, Record,
    Result, SelectQuery, Value,
};
use std::sync::{Arc, Mutex};

/// Keeps the SQL and arguments of every statement and answers with canned rows
#[derive(Default)]
struct RecordingExecutor {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Vec<serde_json::Value>,
}

impl RecordingExecutor {
    fn with_rows(rows: Vec<serde_json::Value>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
    }

    fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.statements.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    type Context = ();

    async fn execute(&self, _ctx: Option<&()>, sql: &str, args: &[Value]) -> Result<ExecResult> {
        self.record(sql, args);
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    async fn fetch_all<T>(&self, _ctx: Option<&()>, sql: &str, args: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.record(sql, args);
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            rows.push(serde_json::from_value(row.clone())?);
        }
        Ok(rows)
    }

    async fn fetch_one<T>(&self, ctx: Option<&()>, sql: &str, args: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.fetch_optional(ctx, sql, args)
            .await?
            .ok_or_else(|| Error::invalid_query("no rows in result set"))
    }

    async fn fetch_optional<T>(
        &self,
        _ctx: Option<&()>,
        sql: &str,
        args: &[Value],
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.record(sql, args);
        match self.rows.first() {
            Some(row) => Ok(Some(serde_json::from_value(row.clone())?)),
            None => Ok(None),
        }
    }
}

struct Address {
    city: String,
}

impl Record for Address {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::new("City", |a: &Address| a.city.clone().into())]
    }
}

struct Customer {
    id: i64,
    email: String,
    status: i32,
    address: Address,
    internal: String,
}

impl Record for Customer {
    fn table_name() -> String {
        "customers".to_string()
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::new("ID", |c: &Customer| c.id.into()),
            Field::new("Email", |c: &Customer| c.email.clone().into()).tag("email_address"),
            Field::new("Status", |c: &Customer| c.status.into()),
            Field::nested("Address", |c: &Customer| &c.address),
            Field::new("Internal", |c: &Customer| c.internal.clone().into()).tag("-"),
        ]
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct CustomerRow {
    id: i64,
    email_address: String,
}

#[test]
fn test_standard_insert_from_columns() {
    let db = Db::with_dialect(Arc::new(Standard));
    let q = db
        .insert("users", &columns([("name", Value::from("James")), ("age", Value::from(30))]))
        .unwrap();
    assert_eq!(q.sql(), r#"INSERT INTO "users" ("age", "name") VALUES ({:p0}, {:p1})"#);
    assert_eq!(q.params(), &Params::new().with("p0", 30).with("p1", "James"));
    assert_eq!(q.args().unwrap(), vec![Value::I32(30), Value::from("James")]);
}

#[test]
fn test_offset_fetch_pagination() {
    let q = SelectQuery::new(Arc::new(MsSql))
        .select(["id", "name"])
        .from(["users"])
        .limit(10)
        .offset(2)
        .build();
    assert_eq!(
        q.raw_sql(),
        "SELECT [id], [name] FROM [users] ORDER BY (SELECT NULL) OFFSET 2 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_backtick_identifier_markers() {
    let q = Query::new(Arc::new(MySql), "SELECT * FROM {{public.user}} WHERE [[user.id]]=1");
    assert_eq!(q.raw_sql(), "SELECT * FROM `public`.`user` WHERE `user`.`id`=1");
}

#[test]
fn test_hash_rendering_is_deterministic() {
    let db = Db::with_dialect(Arc::new(Standard));
    let build = || {
        db.select(["id"])
            .from(["users"])
            .where_(Expr::hash([
                ("status", Value::from(1)),
                ("deleted_at", Value::Null),
                ("age", Value::from(30)),
            ]))
            .build()
    };
    let first = build();
    assert_eq!(
        first.sql(),
        r#"SELECT "id" FROM "users" WHERE "age"={:p0} AND "deleted_at" IS NULL AND "status"={:p1}"#
    );
    assert_eq!(first.sql(), build().sql());
}

#[test]
fn test_empty_in_lists() {
    let db = Db::with_dialect(Arc::new(Standard));
    let q = db
        .select(Vec::<String>::new())
        .from(["users"])
        .where_(Expr::is_in("id", Vec::<Value>::new()))
        .build();
    assert_eq!(q.sql(), r#"SELECT * FROM "users" WHERE 0=1"#);
    assert!(q.params().is_empty());

    let q = db
        .select(Vec::<String>::new())
        .from(["users"])
        .where_(Expr::not_in("id", Vec::<Value>::new()))
        .build();
    assert_eq!(q.sql(), r#"SELECT * FROM "users""#);
}

#[test]
fn test_missing_parameter_names_placeholder() {
    let registry = DialectRegistry::default();
    let db = Db::new(&registry, "postgres");
    let q = db
        .new_query("SELECT * FROM users WHERE id={:id} AND email={:email}")
        .bind(Params::new().with("id", 1));
    match q.args() {
        Err(Error::MissingParameter { name }) => assert_eq!(name, "email"),
        other => panic!("unexpected result: {:?}", other),
    }

    let q = q.bind_value("email", "a@example.com");
    assert_eq!(
        q.args().unwrap(),
        vec![Value::I32(1), Value::from("a@example.com")]
    );
}

#[test]
fn test_record_mapping_rules() {
    let mapping = column_mapping::<Customer>(default_field_mapper);
    let db_names: Vec<&str> = mapping.columns().iter().map(|c| c.db_name()).collect();
    assert_eq!(db_names, vec!["id", "email_address", "status", "address.city"]);
    assert!(mapping.by_name("Internal").is_none());
    assert_eq!(
        mapping.by_name("Address.City").map(|c| c.db_name()),
        Some("address.city")
    );
    assert_eq!(mapping.pk_names(), ["ID"]);
}

#[test]
fn test_model_round_trip_through_executor() {
    let registry = DialectRegistry::default();
    let db = Db::from_config(&registry, &DbConfig::new("mysql"));
    let executor = RecordingExecutor::default();
    let customer = Customer {
        id: 0,
        email: "ana@example.com".to_string(),
        status: 1,
        address: Address {
            city: "Lisbon".to_string(),
        },
        internal: "secret".to_string(),
    };

    tokio_test::block_on(async {
        db.model(&customer)
            .exclude(["Address.City"])
            .insert(&[])
            .unwrap()
            .execute(&executor)
            .await
            .unwrap();
    });

    let statements = executor.statements();
    assert_eq!(
        statements[0].0,
        "INSERT INTO `customers` (`email_address`, `status`) VALUES (?, ?)"
    );
    assert_eq!(
        statements[0].1,
        vec![Value::from("ana@example.com"), Value::I32(1)]
    );
}

#[tokio::test]
async fn test_select_by_pk_fetches_row() {
    let registry = DialectRegistry::default();
    let db = Db::new(&registry, "pgx");
    let executor = RecordingExecutor::with_rows(vec![
        serde_json::json!({"id": 5, "email_address": "ana@example.com"}),
    ]);

    let row: CustomerRow = db
        .select_by_pk::<Customer>(5i64)
        .unwrap()
        .select(["id", "email_address"])
        .one(&executor)
        .await
        .unwrap();
    assert_eq!(
        row,
        CustomerRow {
            id: 5,
            email_address: "ana@example.com".to_string()
        }
    );

    let statements = executor.statements();
    assert_eq!(
        statements[0].0,
        r#"SELECT "id", "email_address" FROM "customers" WHERE "id"=$1"#
    );
    assert_eq!(statements[0].1, vec![Value::I64(5)]);
}

#[tokio::test]
async fn test_repeated_placeholder_binds_each_occurrence() {
    let registry = DialectRegistry::default();
    let db = Db::new(&registry, "postgres");
    let executor = RecordingExecutor::default();

    let q = db
        .new_query("SELECT * FROM {{users}} WHERE [[first_name]] LIKE {:kw} OR [[last_name]] LIKE {:kw}")
        .bind_value("kw", "%an%");
    let _: Vec<CustomerRow> = q.all(&executor).await.unwrap();

    let statements = executor.statements();
    assert_eq!(
        statements[0].0,
        r#"SELECT * FROM "users" WHERE "first_name" LIKE $1 OR "last_name" LIKE $2"#
    );
    assert_eq!(
        statements[0].1,
        vec![Value::from("%an%"), Value::from("%an%")]
    );
}
