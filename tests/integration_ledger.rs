//! Ledger Engine integration tests
//!
//! Conservation, overdraft protection, rollback and concurrency against a
//! real PostgreSQL database.

use std::sync::Arc;

use async_trait::async_trait;
use coinshop::domain::{
    Account, AccountId, ItemId, PurchaseId, PurchasedItem, ReceivedCoins, SentCoins,
    TransactionId,
};
use coinshop::handlers::{LedgerEngine, PurchaseCommand, SummaryReader, TransferCommand};
use coinshop::store::{
    AccountStore, PgAccountStore, PgCatalogStore, PgTransactionLog, StoreError, TransactionLog,
};
use coinshop::{AppError, DomainError, OperationContext};
use sqlx::PgConnection;
use tokio::task::JoinSet;

mod common;

fn ctx() -> OperationContext {
    OperationContext::new()
}

// =========================================================================
// Failure injection
// =========================================================================

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("injected failure".to_string()))
}

/// Log whose transfer append always fails, after balances were adjusted
struct FailingTransferLog;

#[async_trait]
impl TransactionLog for FailingTransferLog {
    async fn append_transfer(
        &self,
        _conn: &mut PgConnection,
        _source: AccountId,
        _destination: AccountId,
        _amount: i64,
    ) -> Result<TransactionId, StoreError> {
        Err(injected())
    }

    async fn append_purchase(
        &self,
        conn: &mut PgConnection,
        buyer: AccountId,
        item_id: ItemId,
        price: i64,
    ) -> Result<PurchaseId, StoreError> {
        PgTransactionLog.append_purchase(conn, buyer, item_id, price).await
    }

    async fn purchased_items(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<PurchasedItem>, StoreError> {
        PgTransactionLog.purchased_items(conn, account_id).await
    }

    async fn received_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<ReceivedCoins>, StoreError> {
        PgTransactionLog.received_coins(conn, account_id).await
    }

    async fn sent_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<SentCoins>, StoreError> {
        PgTransactionLog.sent_coins(conn, account_id).await
    }
}

/// Account store whose debits fail; credits and reads pass through
struct FailingDebits;

#[async_trait]
impl AccountStore for FailingDebits {
    async fn get_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError> {
        PgAccountStore.get_balance(conn, account_id).await
    }

    async fn lock_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError> {
        PgAccountStore.lock_balance(conn, account_id).await
    }

    async fn adjust_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
        delta: i64,
    ) -> Result<(), StoreError> {
        if delta < 0 {
            return Err(injected());
        }
        PgAccountStore.adjust_balance(conn, account_id, delta).await
    }

    async fn create_account(
        &self,
        conn: &mut PgConnection,
        username: &str,
        credential_hash: &str,
        starting_balance: i64,
    ) -> Result<AccountId, StoreError> {
        PgAccountStore
            .create_account(conn, username, credential_hash, starting_balance)
            .await
    }

    async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Account, StoreError> {
        PgAccountStore.find_by_name(conn, username).await
    }

    async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Account, StoreError> {
        PgAccountStore.find_by_id(conn, account_id).await
    }
}

// =========================================================================
// Transfer
// =========================================================================

#[tokio::test]
async fn test_transfer_moves_coins() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (alice, _) = common::create_account(&pool, "alice", 1000).await;
    let (bob, bob_name) = common::create_account(&pool, "bob", 0).await;

    let id = ledger
        .transfer(TransferCommand::new(alice, bob_name, 10), &ctx())
        .await
        .unwrap();

    assert_eq!(common::balance_of(&pool, alice).await, 990);
    assert_eq!(common::balance_of(&pool, bob).await, 10);
    assert_eq!(common::transfer_rows(&pool, alice).await, 1);

    let (source, destination, amount): (Option<i32>, i32, i64) =
        sqlx::query_as("SELECT source, destination, amount FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(source, Some(alice));
    assert_eq!(destination, bob);
    assert_eq!(amount, 10);
}

#[tokio::test]
async fn test_transfer_conserves_total() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (a, a_name) = common::create_account(&pool, "a", 400).await;
    let (b, b_name) = common::create_account(&pool, "b", 600).await;

    for (from, to, amount) in [(a, &b_name, 150), (b, &a_name, 70), (a, &b_name, 1)] {
        ledger
            .transfer(TransferCommand::new(from, to.clone(), amount), &ctx())
            .await
            .unwrap();
    }

    let a_after = common::balance_of(&pool, a).await;
    let b_after = common::balance_of(&pool, b).await;
    assert_eq!(a_after, 400 - 150 + 70 - 1);
    assert_eq!(a_after + b_after, 1000);
}

#[tokio::test]
async fn test_transfer_entire_balance() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (a, _) = common::create_account(&pool, "all_in", 50).await;
    let (_, b_name) = common::create_account(&pool, "all_in_dst", 0).await;

    ledger
        .transfer(TransferCommand::new(a, b_name, 50), &ctx())
        .await
        .unwrap();

    assert_eq!(common::balance_of(&pool, a).await, 0);
}

#[tokio::test]
async fn test_transfer_from_very_large_balance() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (whale, _) = common::create_account(&pool, "whale", 2_000_000_000_000).await;
    let (minnow, minnow_name) = common::create_account(&pool, "minnow", 0).await;

    ledger
        .transfer(TransferCommand::new(whale, minnow_name, 10), &ctx())
        .await
        .unwrap();

    assert_eq!(common::balance_of(&pool, whale).await, 1_999_999_999_990);
    assert_eq!(common::balance_of(&pool, minnow).await, 10);
}

#[tokio::test]
async fn test_transfer_to_unknown_user() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (alice, _) = common::create_account(&pool, "alice", 1000).await;

    let result = ledger
        .transfer(
            TransferCommand::new(alice, common::unique_name("ghost"), 10),
            &ctx(),
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::UserNotFound(_)))
    ));
    assert_eq!(common::balance_of(&pool, alice).await, 1000);
    assert_eq!(common::transfer_rows(&pool, alice).await, 0);
}

#[tokio::test]
async fn test_transfer_insufficient_funds() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (poor, _) = common::create_account(&pool, "poor", 5).await;
    let (rich, rich_name) = common::create_account(&pool, "rich", 0).await;

    let result = ledger
        .transfer(TransferCommand::new(poor, rich_name, 10), &ctx())
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::InsufficientFunds {
            required: 10,
            available: 5
        }))
    ));
    assert_eq!(common::balance_of(&pool, poor).await, 5);
    assert_eq!(common::balance_of(&pool, rich).await, 0);
    assert_eq!(common::transfer_rows(&pool, poor).await, 0);
}

#[tokio::test]
async fn test_self_transfer_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (alice, alice_name) = common::create_account(&pool, "narcissus", 1000).await;

    let result = ledger
        .transfer(TransferCommand::new(alice, alice_name, 10), &ctx())
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::SameAccountTransfer))
    ));
    assert_eq!(common::balance_of(&pool, alice).await, 1000);
    assert_eq!(common::transfer_rows(&pool, alice).await, 0);
}

#[tokio::test]
async fn test_transfer_validation_happens_before_lookup() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (alice, _) = common::create_account(&pool, "alice", 1000).await;

    let zero = ledger
        .transfer(TransferCommand::new(alice, "whoever", 0), &ctx())
        .await;
    assert!(matches!(zero, Err(AppError::Domain(DomainError::InvalidAmount(_)))));

    let empty = ledger
        .transfer(TransferCommand::new(alice, "", 10), &ctx())
        .await;
    assert!(matches!(empty, Err(AppError::Domain(DomainError::Validation(_)))));
}

#[tokio::test]
async fn test_failed_log_append_rolls_back_transfer() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::with_stores(
        pool.clone(),
        Arc::new(PgAccountStore),
        Arc::new(PgCatalogStore),
        Arc::new(FailingTransferLog),
    );

    let (alice, _) = common::create_account(&pool, "alice", 1000).await;
    let (bob, bob_name) = common::create_account(&pool, "bob", 0).await;

    let result = ledger
        .transfer(TransferCommand::new(alice, bob_name, 10), &ctx())
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(common::balance_of(&pool, alice).await, 1000);
    assert_eq!(common::balance_of(&pool, bob).await, 0);
    assert_eq!(common::transfer_rows(&pool, alice).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_transfers_never_overdraw() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (source, _) = common::create_account(&pool, "hot", 100).await;
    let (sink, sink_name) = common::create_account(&pool, "sink", 0).await;

    let mut tasks = JoinSet::new();
    for _ in 0..25 {
        let ledger = ledger.clone();
        let command = TransferCommand::new(source, sink_name.clone(), 10);
        tasks.spawn(async move { ledger.transfer(command, &OperationContext::new()).await });
    }

    let (mut succeeded, mut insufficient) = (0, 0);
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::Domain(DomainError::InsufficientFunds { .. })) => insufficient += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(insufficient, 15);
    assert_eq!(common::balance_of(&pool, source).await, 0);
    assert_eq!(common::balance_of(&pool, sink).await, 100);
    assert_eq!(common::transfer_rows(&pool, source).await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_crossing_transfers_complete() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (a, a_name) = common::create_account(&pool, "cross_a", 500).await;
    let (b, b_name) = common::create_account(&pool, "cross_b", 500).await;

    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let ledger = ledger.clone();
        let command = if i % 2 == 0 {
            TransferCommand::new(a, b_name.clone(), 5)
        } else {
            TransferCommand::new(b, a_name.clone(), 5)
        };
        tasks.spawn(async move { ledger.transfer(command, &OperationContext::new()).await });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    assert_eq!(common::balance_of(&pool, a).await, 500);
    assert_eq!(common::balance_of(&pool, b).await, 500);
}

// =========================================================================
// Purchase
// =========================================================================

#[tokio::test]
async fn test_purchase_debits_price() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (buyer, _) = common::create_account(&pool, "buyer", 1000).await;

    let id = ledger
        .purchase(PurchaseCommand::new(buyer, "t-shirt"), &ctx())
        .await
        .unwrap();

    assert_eq!(common::balance_of(&pool, buyer).await, 920);
    assert_eq!(common::purchase_rows(&pool, buyer).await, 1);

    let (user_id, item_name, price): (i32, String, i64) = sqlx::query_as(
        r#"
        SELECT p.user_id, s.name, p.price
        FROM purchases p JOIN shop s ON p.item_id = s.id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(user_id, buyer);
    assert_eq!(item_name, "t-shirt");
    assert_eq!(price, 80);
}

#[tokio::test]
async fn test_purchase_insufficient_funds() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (buyer, _) = common::create_account(&pool, "broke", 5).await;

    let result = ledger
        .purchase(PurchaseCommand::new(buyer, "pen"), &ctx())
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::InsufficientFunds {
            required: 10,
            available: 5
        }))
    ));
    assert_eq!(common::balance_of(&pool, buyer).await, 5);
    assert_eq!(common::purchase_rows(&pool, buyer).await, 0);
}

#[tokio::test]
async fn test_purchase_unknown_item() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    let (buyer, _) = common::create_account(&pool, "buyer", 1000).await;

    let result = ledger
        .purchase(PurchaseCommand::new(buyer, "spaceship"), &ctx())
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::ItemNotFound(_)))
    ));
    assert_eq!(common::balance_of(&pool, buyer).await, 1000);
}

#[tokio::test]
async fn test_failed_debit_rolls_back_purchase() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::with_stores(
        pool.clone(),
        Arc::new(FailingDebits),
        Arc::new(PgCatalogStore),
        Arc::new(PgTransactionLog),
    );

    let (buyer, _) = common::create_account(&pool, "buyer", 1000).await;

    let result = ledger
        .purchase(PurchaseCommand::new(buyer, "cup"), &ctx())
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(common::balance_of(&pool, buyer).await, 1000);
    assert_eq!(common::purchase_rows(&pool, buyer).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_purchases_never_overdraw() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());

    // Enough for exactly three hoodies
    let (buyer, _) = common::create_account(&pool, "shopaholic", 900).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        tasks.spawn(async move {
            ledger
                .purchase(PurchaseCommand::new(buyer, "hoody"), &OperationContext::new())
                .await
        });
    }

    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(common::balance_of(&pool, buyer).await, 0);
    assert_eq!(common::purchase_rows(&pool, buyer).await, 3);
}

// =========================================================================
// Summary
// =========================================================================

#[tokio::test]
async fn test_user_summary_aggregates_history() {
    let Some(pool) = common::setup_test_db().await else { return };
    let ledger = LedgerEngine::new(pool.clone());
    let reader = SummaryReader::new(pool.clone());

    let (alice, alice_name) = common::create_account(&pool, "alice", 1000).await;
    let (bob, bob_name) = common::create_account(&pool, "bob", 1000).await;

    ledger
        .transfer(TransferCommand::new(alice, bob_name.clone(), 10), &ctx())
        .await
        .unwrap();
    ledger
        .transfer(TransferCommand::new(bob, alice_name.clone(), 3), &ctx())
        .await
        .unwrap();
    for item in ["cup", "cup", "pen"] {
        ledger
            .purchase(PurchaseCommand::new(alice, item), &ctx())
            .await
            .unwrap();
    }

    let summary = reader.user_summary(alice).await.unwrap();

    assert_eq!(summary.username, alice_name);
    assert_eq!(summary.coins, 1000 - 10 + 3 - 20 - 20 - 10);
    assert_eq!(
        summary.purchased_items,
        vec![
            PurchasedItem {
                item_name: "cup".to_string(),
                quantity: 2
            },
            PurchasedItem {
                item_name: "pen".to_string(),
                quantity: 1
            },
        ]
    );
    assert_eq!(
        summary.transactions_summary.sent_coins,
        vec![SentCoins {
            destination_username: bob_name.clone(),
            amount: 10
        }]
    );
    assert_eq!(
        summary.transactions_summary.received_coins,
        vec![ReceivedCoins {
            source_username: bob_name,
            amount: 3
        }]
    );

    // No writes in between: identical result
    assert_eq!(reader.user_summary(alice).await.unwrap(), summary);
}

#[tokio::test]
async fn test_user_summary_empty_history() {
    let Some(pool) = common::setup_test_db().await else { return };
    let reader = SummaryReader::new(pool.clone());

    let (fresh, fresh_name) = common::create_account(&pool, "fresh", 1000).await;

    let summary = reader.user_summary(fresh).await.unwrap();

    assert_eq!(summary.username, fresh_name);
    assert_eq!(summary.coins, 1000);
    assert!(summary.purchased_items.is_empty());
    assert!(summary.transactions_summary.received_coins.is_empty());
    assert!(summary.transactions_summary.sent_coins.is_empty());
}

#[tokio::test]
async fn test_user_summary_unknown_account() {
    let Some(pool) = common::setup_test_db().await else { return };
    let reader = SummaryReader::new(pool);

    let result = reader.user_summary(i32::MAX).await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::AccountNotFound(_)))
    ));
}
