//! Common test utilities
#![allow(dead_code)]

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to `DATABASE_URL` and apply migrations.
///
/// Returns `None` when no database is configured so DB-backed suites are
/// skipped instead of failing.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    coinshop::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Username that cannot collide with other tests sharing the database
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Insert an account with an exact balance, bypassing sign-up
pub async fn create_account(pool: &PgPool, prefix: &str, coins: i64) -> (i32, String) {
    let username = unique_name(prefix);
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO userlist (username, password, coins) VALUES ($1, '-', $2) RETURNING id",
    )
    .bind(&username)
    .bind(coins)
    .fetch_one(pool)
    .await
    .expect("Failed to seed account");

    (id, username)
}

pub async fn balance_of(pool: &PgPool, account_id: i32) -> i64 {
    sqlx::query_scalar("SELECT coins FROM userlist WHERE id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

/// Number of transfers in either direction touching the account
pub async fn transfer_rows(pool: &PgPool, account_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE source = $1 OR destination = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count transactions")
}

pub async fn purchase_rows(pool: &PgPool, account_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE user_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count purchases")
}
