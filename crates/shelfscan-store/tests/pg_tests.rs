//! PostgreSQL integration tests.
//!
//! Run with `TEST_DATABASE_URL` pointing at a scratch database. Tables live
//! in the `shelfscan_test` schema, which is recreated by every test.

use std::str::FromStr;

use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use shelfscan_store::{PgProductStore, ProductStore};

const SCHEMA: &str = "shelfscan_test";

async fn setup(rows: &[(&str, &str, &str, i64)]) -> PgProductStore {
    dotenvy::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");

    let admin = PgPool::connect(&url).await.expect("Failed to connect");
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", SCHEMA))
        .execute(&admin)
        .await
        .unwrap();
    sqlx::query(&format!("DROP TABLE IF EXISTS {}.products", SCHEMA))
        .execute(&admin)
        .await
        .unwrap();
    sqlx::query(&format!(
        r#"
        CREATE TABLE {}.products (
            id SERIAL PRIMARY KEY,
            product_name VARCHAR(100) NOT NULL,
            category VARCHAR(100) NOT NULL,
            barcode VARCHAR(64) NOT NULL,
            price INTEGER NOT NULL
        )
        "#,
        SCHEMA
    ))
    .execute(&admin)
    .await
    .unwrap();

    for (name, category, barcode, price) in rows {
        sqlx::query(&format!(
            "INSERT INTO {}.products (product_name, category, barcode, price) VALUES ($1, $2, $3, $4)",
            SCHEMA
        ))
        .bind(*name)
        .bind(*category)
        .bind(*barcode)
        .bind(*price as i32)
        .execute(&admin)
        .await
        .unwrap();
    }
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)
        .unwrap()
        .options([("search_path", SCHEMA)]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("Failed to connect");

    PgProductStore::from_pool(pool)
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_name_exact_match() {
    let store = setup(&[
        ("Bag", "Accessories", "111", 45),
        ("Coat", "Outerwear", "222", 120),
    ])
    .await;

    let bag = store.find_by_name("Bag").await.unwrap().expect("Bag exists");
    assert_eq!(bag.product_name, "Bag");
    assert_eq!(bag.category, "Accessories");
    assert_eq!(bag.barcode, "111");
    assert_eq!(bag.price, 45);

    assert!(store.find_by_name("Sandal").await.unwrap().is_none());
    assert!(store.find_by_name("Ba").await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_name_is_case_sensitive() {
    let store = setup(&[("Bag", "Accessories", "111", 45)]).await;

    assert!(store.find_by_name("bag").await.unwrap().is_none());
    assert!(store.find_by_name("BAG").await.unwrap().is_none());
    assert!(store.find_by_name("Bag").await.unwrap().is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_list_all_sorted_regardless_of_insert_order() {
    let store = setup(&[
        ("Trouser", "Bottoms", "6", 60),
        ("Bag", "Accessories", "1", 45),
        ("Sneaker", "Footwear", "5", 90),
        ("Coat", "Outerwear", "2", 120),
        ("Sandal", "Footwear", "4", 30),
        ("Dress", "Dresses", "3", 80),
    ])
    .await;

    let names: Vec<String> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.product_name)
        .collect();

    assert_eq!(
        names,
        vec!["Bag", "Coat", "Dress", "Sandal", "Sneaker", "Trouser"]
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_update_price_is_observed() {
    let store = setup(&[
        ("Bag", "Accessories", "111", 45),
        ("Coat", "Outerwear", "222", 120),
    ])
    .await;

    let coat_id = store.find_by_name("Coat").await.unwrap().unwrap().id;
    let rows = store.update_price(coat_id, 500).await.unwrap();
    assert_eq!(rows, 1);

    let coat = store.find_by_name("Coat").await.unwrap().unwrap();
    assert_eq!(coat.price, 500);

    let listed = store.list_all().await.unwrap();
    let entry = listed.iter().find(|p| p.id == coat_id).unwrap();
    assert_eq!(entry.price, 500);

    // Untouched row keeps its price.
    assert_eq!(store.find_by_name("Bag").await.unwrap().unwrap().price, 45);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_update_price_unknown_id_is_noop() {
    let store = setup(&[("Bag", "Accessories", "111", 45)]).await;

    let rows = store.update_price(9_999, 1).await.unwrap();
    assert_eq!(rows, 0);

    let listed = store.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].price, 45);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_update_price_accepts_negative() {
    let store = setup(&[("Bag", "Accessories", "111", 45)]).await;
    let id = store.find_by_name("Bag").await.unwrap().unwrap().id;

    store.update_price(id, -10).await.unwrap();
    assert_eq!(store.find_by_name("Bag").await.unwrap().unwrap().price, -10);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_ping() {
    let store = setup(&[]).await;
    store.ping().await.unwrap();
}
