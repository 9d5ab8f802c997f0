use std::collections::BTreeSet;

use assetdesk::config::DatabaseConfig;
use assetdesk::db;
use assetdesk::sequence;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

async fn setup() -> DatabaseConnection {
    db::init_database(&DatabaseConfig::sqlite_memory())
        .await
        .expect("in-memory database")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn concurrent_allocations_are_unique_and_dense() {
    let db = setup().await;
    let date = day(2024, 6, 7);

    let results = futures::future::join_all(
        (0..25).map(|_| sequence::allocate(&db, date)),
    )
    .await;

    let counts: BTreeSet<i64> = results
        .into_iter()
        .map(|r| r.expect("allocation").count)
        .collect();
    assert_eq!(counts, (1..=25).collect::<BTreeSet<i64>>());
}

#[tokio::test]
async fn counters_are_scoped_per_date() {
    let db = setup().await;

    let a = sequence::allocate(&db, day(2024, 6, 7)).await.unwrap();
    let b = sequence::allocate(&db, day(2024, 6, 7)).await.unwrap();
    let c = sequence::allocate(&db, day(2024, 6, 8)).await.unwrap();

    assert_eq!(a.count, 1);
    assert_eq!(b.count, 2);
    assert_eq!(c.count, 1);
    assert_eq!(c.date_key, "240608");
}

#[tokio::test]
async fn allocated_codes_follow_the_daily_format() {
    let db = setup().await;
    let date = day(2024, 6, 7);

    let mut last = String::new();
    for _ in 0..7 {
        last = sequence::next_asset_code(&db, date).await.unwrap();
    }
    assert_eq!(last, "A24060700007");
    assert_eq!(last.len(), 12);
}

#[tokio::test]
async fn allocation_inside_rolled_back_transaction_is_discarded() {
    use sea_orm::TransactionTrait;

    let db = setup().await;
    let date = day(2024, 6, 7);

    let txn = db.begin().await.unwrap();
    let inside = sequence::allocate(&txn, date).await.unwrap();
    assert_eq!(inside.count, 1);
    txn.rollback().await.unwrap();

    let after = sequence::allocate(&db, date).await.unwrap();
    assert_eq!(after.count, 1);
}
