//! Round-trip tests against a live Postgres server.
//!
//! Ignored by default; run with
//! `EXCHANGE_TEST_DB_URL=postgresql://... cargo test -- --ignored`
//! against a throwaway database.

use chrono::{TimeZone, Utc};
use exchange_rates::etl::clean::clean;
use exchange_rates::etl::load::{ensure_schema, load};
use exchange_rates::etl::transform::transform;
use exchange_rates::model::{FetchPayload, RowWire};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

async fn test_pool() -> PgPool {
    let url = std::env::var("EXCHANGE_TEST_DB_URL")
        .expect("EXCHANGE_TEST_DB_URL must point at a throwaway database");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database")
}

fn payload() -> FetchPayload {
    let mut rates = IndexMap::new();
    rates.insert("EUR".to_string(), "0.9".parse().unwrap());
    rates.insert("JPY".to_string(), "150".parse().unwrap());
    FetchPayload {
        base: "USD".to_string(),
        rates,
        fetched_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        source: "test".to_string(),
    }
}

#[tokio::test]
#[ignore]
async fn ensure_schema_is_idempotent() {
    let pool = test_pool().await;
    ensure_schema(&pool).await.expect("first ensure_schema");
    ensure_schema(&pool).await.expect("second ensure_schema");
    pool.close().await;
}

#[tokio::test]
#[ignore]
async fn empty_load_inserts_nothing() {
    let pool = test_pool().await;
    ensure_schema(&pool).await.unwrap();
    let inserted = load(&pool, &[]).await.unwrap();
    assert_eq!(inserted, 0);
    pool.close().await;
}

#[tokio::test]
#[ignore]
async fn transform_clean_load_round_trip() {
    let pool = test_pool().await;
    sqlx::query("DROP TABLE IF EXISTS exchange_rates")
        .execute(&pool)
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();

    let records = transform(&payload());
    let rows: Vec<RowWire> = records.iter().map(RowWire::encode).collect();
    let outcome = clean(rows);
    assert_eq!(outcome.dropped, 0);

    let inserted = load(&pool, &outcome.records).await.unwrap();
    assert_eq!(inserted, 2);

    let stored = sqlx::query(
        "SELECT target_currency, rate FROM exchange_rates ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].get::<String, _>("target_currency"), "EUR");
    assert_eq!(stored[0].get::<Decimal, _>("rate"), "0.9".parse().unwrap());
    assert_eq!(stored[1].get::<String, _>("target_currency"), "JPY");
    assert_eq!(stored[1].get::<Decimal, _>("rate"), "150".parse().unwrap());
    pool.close().await;
}
