use sqlx::sqlite::SqlitePoolOptions;
use sqlxfluent::{
    data, raw, table, DbPool, InValues, IntoData, Model, Querier, SqlxFluentError,
};
use std::sync::Arc;

#[derive(Debug, PartialEq, sqlx::FromRow, Model, IntoData)]
#[model(table = "users")]
struct User {
    id: i64,
    name: String,
    city: Option<String>,
    age: i64,
}

#[derive(Debug, IntoData)]
struct NewUser {
    name: String,
    #[column(name = "city")]
    town: Option<String>,
    age: i64,
    #[skip]
    password_confirm: String,
}

#[derive(Debug, sqlx::FromRow)]
struct Total {
    total: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct Inserted {
    id: i64,
}

async fn setup() -> DbPool {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // 内存库只在单个连接内可见
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let mut db = DbPool::from_sqlite_pool(Arc::new(pool));
    db.exec(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            city TEXT,
            age INTEGER NOT NULL DEFAULT 0
        )",
        Vec::new(),
    )
    .await
    .unwrap();
    db
}

async fn seed(db: &mut DbPool) {
    db.execute(&table("users").insert([
        data! { "name" => "Jack", "city" => "Moscow", "age" => 30 },
        data! { "name" => "John", "city" => Option::<String>::None, "age" => 17 },
        data! { "name" => "Anna", "city" => "Moscow", "age" => 25 },
        data! { "name" => "Olga", "city" => "Paris", "age" => 41 },
    ]))
    .await
    .unwrap();
}

async fn count(db: &mut DbPool) -> i64 {
    let total: Total = db
        .first(&table("users").count("*", "total"))
        .await
        .unwrap();
    total.total
}

#[tokio::test]
async fn test_insert_and_select() {
    let mut db = setup().await;
    let result = db
        .execute(&table("users").insert([
            data! { "name" => "Jack", "city" => "Moscow", "age" => 30 },
            data! { "name" => "John", "city" => Option::<String>::None, "age" => 17 },
        ]))
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 2);
    assert_eq!(result.last_insert_id, Some(2));

    let adults: Vec<User> = db
        .get(&User::query().and_where("age", ">", 18))
        .await
        .unwrap();
    assert_eq!(
        adults,
        vec![User {
            id: 1,
            name: "Jack".to_string(),
            city: Some("Moscow".to_string()),
            age: 30,
        }]
    );

    let john: User = db.first(&User::find(2_i64)).await.unwrap();
    assert_eq!(john.name, "John");
    assert_eq!(john.city, None);
}

#[tokio::test]
async fn test_first_without_rows() {
    let mut db = setup().await;
    let err = db.first::<User>(&User::find(99_i64)).await.unwrap_err();
    assert!(matches!(err, SqlxFluentError::NoRows));
}

#[tokio::test]
async fn test_conditions_against_database() {
    let mut db = setup().await;
    seed(&mut db).await;

    let users: Vec<User> = db
        .get(
            &table("users")
                .where_null("city")
                .or_where_group(|b| b.and_where("city", "=", "Moscow").and_where("age", "<", 28))
                .order_by("name", "ASC"),
        )
        .await
        .unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Anna", "John"]);

    let users: Vec<User> = db
        .get(
            &table("users")
                .where_between("age", 20, 35)
                .where_raw(raw!("length(name) = ?", 4))
                .order_by("age", "DESC")
                .limit(1)
                .offset(1),
        )
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Anna");

    let empty: Vec<i64> = Vec::new();
    let none: Vec<User> = db
        .get(&table("users").where_in("id", empty))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_where_in_sub_query() {
    let mut db = setup().await;
    seed(&mut db).await;

    let users: Vec<User> = db
        .get(
            &table("users")
                .where_in(
                    "id",
                    InValues::with(|b| {
                        b.from("users")
                            .select(["id"])
                            .and_where("city", "=", "Moscow")
                    }),
                )
                .order_by("id", "ASC"),
        )
        .await
        .unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Jack", "Anna"]);
}

#[tokio::test]
async fn test_group_having() {
    let mut db = setup().await;
    seed(&mut db).await;

    #[derive(Debug, sqlx::FromRow)]
    struct CityTotal {
        city: String,
        total: i64,
    }

    let rows: Vec<CityTotal> = db
        .get(
            &table("users")
                .select(["city"])
                .count("*", "total")
                .where_not_null("city")
                .group_by(["city"])
                .having("total", ">", 1),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].city, "Moscow");
    assert_eq!(rows[0].total, 2);
}

#[tokio::test]
async fn test_update_and_delete() {
    let mut db = setup().await;
    seed(&mut db).await;

    let updated = db
        .execute(
            &table("users")
                .update(data! { "city" => "Berlin", "age" => raw!("age + ?", 1) })
                .and_where("name", "=", "Jack"),
        )
        .await
        .unwrap();
    assert_eq!(updated.rows_affected, 1);

    let jack: User = db
        .first(&User::query().and_where("name", "=", "Jack"))
        .await
        .unwrap();
    assert_eq!(jack.city.as_deref(), Some("Berlin"));
    assert_eq!(jack.age, 31);

    let deleted = db
        .execute(&table("users").delete().where_in("name", ["John", "Olga"]))
        .await
        .unwrap();
    assert_eq!(deleted.rows_affected, 2);
    assert_eq!(count(&mut db).await, 2);
}

#[tokio::test]
async fn test_derived_payloads() {
    let mut db = setup().await;

    let new_user = NewUser {
        name: "Ivan".to_string(),
        town: Some("Kazan".to_string()),
        age: 33,
        password_confirm: "secret".to_string(),
    };
    assert_eq!(new_user.password_confirm, "secret");
    db.execute(&User::query().insert([new_user.into_data()]))
        .await
        .unwrap();

    let ivan: User = db.first(&User::find(1_i64)).await.unwrap();
    assert_eq!(ivan.city.as_deref(), Some("Kazan"));

    let changed = User {
        city: None,
        age: 34,
        ..ivan
    };
    let mut payload = changed.into_data();
    payload.remove("id");
    db.execute(&User::query().update(payload).and_where("id", "=", 1_i64))
        .await
        .unwrap();

    let ivan: User = db.first(&User::find(1_i64)).await.unwrap();
    assert_eq!(ivan.city, None);
    assert_eq!(ivan.age, 34);
}

#[tokio::test]
async fn test_or_ignore_and_returning() {
    let mut db = setup().await;

    let inserted: Vec<Inserted> = db
        .get(
            &table("users")
                .insert([data! { "name" => "Jack", "age" => 30 }])
                .returning(["id"]),
        )
        .await
        .unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].id, 1);

    let ignored = db
        .execute(
            &table("users")
                .insert([data! { "name" => "Jack", "age" => 99 }])
                .or_ignore(),
        )
        .await
        .unwrap();
    assert_eq!(ignored.rows_affected, 0);

    let duplicate = db
        .execute(&table("users").insert([data! { "name" => "Jack", "age" => 99 }]))
        .await;
    assert!(matches!(duplicate, Err(SqlxFluentError::DatabaseError(_))));
}

#[tokio::test]
async fn test_json_payload() {
    let mut db = setup().await;
    let payload = sqlxfluent::Data::try_from(serde_json::json!({
        "name": "Maria",
        "city": null,
        "age": 28
    }))
    .unwrap();
    db.execute(&table("users").insert([payload])).await.unwrap();

    let maria: User = db.first(&User::find(1_i64)).await.unwrap();
    assert_eq!(maria.name, "Maria");
    assert_eq!(maria.city, None);
    assert_eq!(maria.age, 28);
}

#[tokio::test]
async fn test_chunk() {
    let mut db = setup().await;
    seed(&mut db).await;
    db.execute(&table("users").insert([data! { "name" => "Petr", "age" => 50 }]))
        .await
        .unwrap();

    let builder = table("users").order_by("id", "ASC");
    let mut sizes = Vec::new();
    db.chunk(&builder, 2, |rows: Vec<User>| {
        sizes.push(rows.len());
        Ok(true)
    })
    .await
    .unwrap();
    assert_eq!(sizes, vec![2, 2, 1]);

    let mut seen = Vec::new();
    db.chunk(&builder, 3, |rows: Vec<User>| {
        seen.extend(rows.into_iter().map(|u| u.name));
        Ok(false)
    })
    .await
    .unwrap();
    assert_eq!(seen, vec!["Jack", "John", "Anna"]);
}

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let mut db = setup().await;

    let mut tx = db.begin().await.unwrap();
    tx.execute(&table("users").insert([data! { "name" => "Ghost", "age" => 1 }]))
        .await
        .unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(count(&mut db).await, 0);

    let mut tx = db.begin().await.unwrap();
    tx.execute(&table("users").insert([data! { "name" => "Kept", "age" => 2 }]))
        .await
        .unwrap();
    let kept: User = tx
        .first(&User::query().and_where("name", "=", "Kept"))
        .await
        .unwrap();
    assert_eq!(kept.age, 2);
    tx.commit().await.unwrap();
    assert_eq!(count(&mut db).await, 1);
}

#[tokio::test]
async fn test_transaction_macro() {
    let mut db = setup().await;

    let inserted: sqlxfluent::Result<u64> = sqlxfluent::transaction!(db, |tx| async move {
        let result = tx
            .execute(&table("users").insert([data! { "name" => "A", "age" => 1 }]))
            .await?;
        Ok(result.rows_affected)
    })
    .await;
    assert_eq!(inserted.unwrap(), 1);

    let failed: sqlxfluent::Result<()> = sqlxfluent::transaction!(db, |tx| async move {
        tx.execute(&table("users").insert([data! { "name" => "B", "age" => 2 }]))
            .await?;
        Err(SqlxFluentError::InvalidData("abort".to_string()))
    })
    .await;
    assert!(matches!(failed, Err(SqlxFluentError::InvalidData(_))));

    assert_eq!(count(&mut db).await, 1);
}
