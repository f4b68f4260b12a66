use sqlweave_core::dialect::DialectRegistry;
use sqlweave_core::{columns, Db, Expr, ForeignKey, Value};
use std::collections::BTreeMap;

fn main() -> sqlweave_core::Result<()> {
    let registry = DialectRegistry::default();

    for driver in ["mysql", "postgres", "sqlite", "mssql", "oracle"] {
        let db = Db::new(&registry, driver);
        println!("-- {} ({})", driver, db.dialect().name());

        // SELECT with composed conditions and pagination
        let select = db
            .select(["id", "name", "email"])
            .from(["users u"])
            .left_join("profiles p", "p.user_id = u.id")
            .where_(Expr::hash([("u.status", Value::from("active"))]))
            .and_where(Expr::between("u.age", 18, 65))
            .and_where(Expr::like("u.name", ["jo"]))
            .order_by(["u.created_at DESC"])
            .limit(10)
            .offset(20)
            .build();
        println!("SELECT: {}", select.raw_sql());
        println!("  args: {:?}", select.args()?);

        // INSERT and UPDATE from column maps
        let insert = db.insert(
            "users",
            &columns([("name", Value::from("John Doe")), ("age", Value::from(30))]),
        )?;
        println!("INSERT: {}", insert.raw_sql());

        let filter = Expr::hash([("id", 123)]);
        let update = db.update("users", &columns([("email", "new@example.com")]), Some(&filter))?;
        println!("UPDATE: {}", update.raw_sql());

        // DELETE with a subquery condition
        let delete = db.delete(
            "sessions",
            Some(&Expr::or([
                Expr::raw("expires_at < NOW()"),
                Expr::not_in("user_id", [1, 2, 3]),
            ])),
        )?;
        println!("DELETE: {}", delete.raw_sql());

        // Upsert and DDL where the dialect supports them
        let constraints = vec!["id".to_string()];
        match db.upsert("users", &columns([("id", 1), ("age", 31)]), &constraints) {
            Ok(q) => println!("UPSERT: {}", q.raw_sql()),
            Err(err) => println!("UPSERT: {}", err),
        }

        let mut defs = BTreeMap::new();
        defs.insert("id".to_string(), "INT PRIMARY KEY".to_string());
        defs.insert("user_id".to_string(), "INT NOT NULL".to_string());
        println!("DDL: {}", db.create_table("orders", &defs, &[])?.raw_sql());

        let fk = ForeignKey::new("fk_orders_user", ["user_id"], "users", ["id"]).option("ON DELETE CASCADE");
        match db.add_foreign_key("orders", &fk) {
            Ok(q) => println!("DDL: {}", q.raw_sql()),
            Err(err) => println!("DDL: {}", err),
        }
        println!();
    }

    Ok(())
}
