use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlweave_core::dialect::DialectRegistry;
use sqlweave_core::{Db, ExecResult, Executor, Expr, Field, Record, Value};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    email: String,
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
            Field::new("Email", |u: &User| u.email.clone().into()),
            Field::new("Age", |u: &User| u.age.into()),
        ]
    }
}

// Mock executor for demonstration; its context is a deadline it only reports
#[derive(Clone)]
struct MockPool;

impl MockPool {
    fn log(&self, kind: &str, ctx: Option<&Instant>, sql: &str, args: &[Value]) {
        let remaining = ctx.map(|deadline| deadline.saturating_duration_since(Instant::now()));
        println!("{}: {} {:?} (deadline in {:?})", kind, sql, args, remaining);
    }

    fn users() -> serde_json::Value {
        serde_json::json!([
            {"id": 1, "name": "Alice", "email": "alice@example.com", "age": 25},
            {"id": 2, "name": "Bob", "email": "bob@example.com", "age": 30}
        ])
    }
}

impl Executor for MockPool {
    type Context = Instant;

    async fn execute(
        &self,
        ctx: Option<&Instant>,
        sql: &str,
        args: &[Value],
    ) -> sqlweave_core::Result<ExecResult> {
        self.log("EXECUTE", ctx, sql, args);
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(3),
        })
    }

    async fn fetch_all<T>(
        &self,
        ctx: Option<&Instant>,
        sql: &str,
        args: &[Value],
    ) -> sqlweave_core::Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.log("FETCH_ALL", ctx, sql, args);
        Ok(serde_json::from_value(Self::users())?)
    }

    async fn fetch_one<T>(
        &self,
        ctx: Option<&Instant>,
        sql: &str,
        args: &[Value],
    ) -> sqlweave_core::Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.log("FETCH_ONE", ctx, sql, args);
        Ok(serde_json::from_value(Self::users()[0].clone())?)
    }

    async fn fetch_optional<T>(
        &self,
        ctx: Option<&Instant>,
        sql: &str,
        args: &[Value],
    ) -> sqlweave_core::Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.log("FETCH_OPTIONAL", ctx, sql, args);
        Ok(Some(serde_json::from_value(Self::users()[1].clone())?))
    }
}

#[tokio::main]
async fn main() -> sqlweave_core::Result<()> {
    let registry = DialectRegistry::default();
    let db = Db::new(&registry, "postgres");
    let pool = MockPool;

    // Fetch with the fluent builder
    let users: Vec<User> = db
        .select(["id", "name", "email", "age"])
        .from(["users"])
        .where_(Expr::raw("age > {:min_age}"))
        .and_bind("min_age", 18)
        .all(&pool)
        .await?;
    println!("Found {} users", users.len());

    // Raw SQL templates with an explicit deadline
    let deadline = Instant::now() + Duration::from_secs(5);
    let user: User = db
        .new_query("SELECT * FROM {{users}} WHERE [[email]]={:email}")
        .bind_value("email", "alice@example.com")
        .one_with_context(&pool, Some(&deadline))
        .await?;
    println!("Loaded {:?}", user);

    // Lookup by primary key
    let bob: Option<User> = db.select_by_pk::<User>(2i64)?.optional(&pool).await?;
    println!("Loaded {:?}", bob);

    // Model writes
    let carol = User {
        id: 0,
        name: "Carol".to_string(),
        email: "carol@example.com".to_string(),
        age: 41,
    };
    let result = db.model(&carol).insert(&[])?.execute(&pool).await?;
    println!("Inserted id {:?}", result.last_insert_id);

    let updated = User { id: 3, ..carol };
    db.model(&updated).exclude(["Email"]).update(&[])?.execute(&pool).await?;
    db.model(&updated).delete()?.execute(&pool).await?;

    Ok(())
}
