use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateBudgetCmd, CreateTransactionCmd, Engine, EngineError, TransactionKind,
    TransactionListFilter, UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

async fn cash_and_food(engine: &Engine, opening_balance: i64) -> (Uuid, Uuid) {
    let wallet = engine
        .create_wallet("alice", "Cash", opening_balance, None, true)
        .await
        .unwrap();
    let category = engine.create_category("alice", "Food", None).await.unwrap();
    (wallet.id, category.id)
}

fn july(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, day, 12, 0, 0).unwrap()
}

async fn july_budget(engine: &Engine, category_id: Uuid, total: i64, limit: i64) -> Uuid {
    engine
        .create_budget(
            CreateBudgetCmd::new(
                "alice",
                "July",
                total,
                Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 7, 31, 23, 59, 59).unwrap(),
            )
            .allocation(category_id, limit),
        )
        .await
        .unwrap()
        .id
}

async fn wallet_balance(engine: &Engine, wallet_id: Uuid) -> i64 {
    engine.wallet("alice", wallet_id).await.unwrap().balance
}

async fn budget_spent(engine: &Engine, budget_id: Uuid) -> i64 {
    engine
        .budget("alice", budget_id)
        .await
        .unwrap()
        .total_spent_minor()
}

#[tokio::test]
async fn expense_income_delete_keep_wallet_and_budget_consistent() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    let expense = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .note("groceries")
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    assert_eq!(expense.amount_minor, 120);
    assert_eq!(wallet_balance(&engine, wallet_id).await, 880);
    assert_eq!(budget_spent(&engine, budget_id).await, 120);

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Income, 50)
                .occurred_at(july(12)),
        )
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 930);
    assert_eq!(budget_spent(&engine, budget_id).await, 120);

    engine
        .delete_transaction("alice", expense.id)
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 1050);
    assert_eq!(budget_spent(&engine, budget_id).await, 0);
}

#[tokio::test]
async fn create_expense_without_funds_leaves_no_trace() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 100).await;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    let err = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds("wallet 'Cash'".to_string())
    );

    assert_eq!(wallet_balance(&engine, wallet_id).await, 100);
    assert_eq!(budget_spent(&engine, budget_id).await, 0);
    let txs = engine
        .list_transactions("alice", 10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn create_then_delete_restores_state_and_second_delete_fails() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    let before_balance = wallet_balance(&engine, wallet_id).await;
    let before_spent = budget_spent(&engine, budget_id).await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    engine.delete_transaction("alice", tx.id).await.unwrap();

    assert_eq!(wallet_balance(&engine, wallet_id).await, before_balance);
    assert_eq!(budget_spent(&engine, budget_id).await, before_spent);

    let err = engine.delete_transaction("alice", tx.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("transaction not exists".to_string())
    );
    assert_eq!(wallet_balance(&engine, wallet_id).await, before_balance);
}

#[tokio::test]
async fn note_only_update_leaves_balances_untouched() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .note("lunch")
                .occurred_at(july(10)),
        )
        .await
        .unwrap();

    let updated = engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).note("bigger lunch"))
        .await
        .unwrap();
    assert_eq!(updated.note.as_deref(), Some("bigger lunch"));
    assert_eq!(updated.amount_minor, 120);

    assert_eq!(wallet_balance(&engine, wallet_id).await, 880);
    assert_eq!(budget_spent(&engine, budget_id).await, 120);
}

#[tokio::test]
async fn amount_update_reconciles_wallet_and_spent() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 200).await;
    let budget_id = july_budget(&engine, food_id, 500, 500).await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 100)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 100);
    assert_eq!(budget_spent(&engine, budget_id).await, 100);

    engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).amount_minor(150))
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 50);
    assert_eq!(budget_spent(&engine, budget_id).await, 150);

    let err = engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).amount_minor(0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_minor must be > 0".to_string())
    );
}

#[tokio::test]
async fn amount_update_checks_funds_after_reversal() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 100).await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 80)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 20);

    // Raising past the current balance is fine: the old effect comes back
    // first, so the check runs against 100, not 20.
    engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).amount_minor(90))
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 10);

    let err = engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).amount_minor(150))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds("wallet 'Cash'".to_string())
    );

    assert_eq!(wallet_balance(&engine, wallet_id).await, 10);
    let stored = engine.transaction("alice", tx.id).await.unwrap();
    assert_eq!(stored.amount_minor, 90);
}

#[tokio::test]
async fn kind_flip_reverses_old_effect_and_applies_new() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    assert_eq!(wallet_balance(&engine, wallet_id).await, 880);
    assert_eq!(budget_spent(&engine, budget_id).await, 120);

    engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).kind(TransactionKind::Income))
        .await
        .unwrap();

    assert_eq!(wallet_balance(&engine, wallet_id).await, 1120);
    assert_eq!(budget_spent(&engine, budget_id).await, 0);
}

#[tokio::test]
async fn category_change_moves_spent_between_allocations() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let fuel_id = engine
        .create_category("alice", "Fuel", None)
        .await
        .unwrap()
        .id;
    let budget_id = engine
        .create_budget(
            CreateBudgetCmd::new(
                "alice",
                "July",
                600,
                Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 7, 31, 23, 59, 59).unwrap(),
            )
            .allocation(food_id, 300)
            .allocation(fuel_id, 300),
        )
        .await
        .unwrap()
        .id;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();

    let spent_for = |budget: &engine::Budget, category_id: Uuid| {
        budget
            .allocations
            .iter()
            .find(|a| a.category_id == category_id)
            .expect("allocation missing")
            .spent_minor
    };

    let budget = engine.budget("alice", budget_id).await.unwrap();
    assert_eq!(spent_for(&budget, food_id), 120);
    assert_eq!(spent_for(&budget, fuel_id), 0);

    engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).category_id(fuel_id))
        .await
        .unwrap();

    let budget = engine.budget("alice", budget_id).await.unwrap();
    assert_eq!(spent_for(&budget, food_id), 0);
    assert_eq!(spent_for(&budget, fuel_id), 120);
    assert_eq!(wallet_balance(&engine, wallet_id).await, 880);
}

#[tokio::test]
async fn date_change_routes_spent_to_the_covering_budget() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;
    let july_id = july_budget(&engine, food_id, 300, 300).await;
    let august_id = engine
        .create_budget(
            CreateBudgetCmd::new(
                "alice",
                "August",
                300,
                Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap(),
            )
            .allocation(food_id, 300),
        )
        .await
        .unwrap()
        .id;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    assert_eq!(budget_spent(&engine, july_id).await, 120);
    assert_eq!(budget_spent(&engine, august_id).await, 0);

    engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .occurred_at(Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(budget_spent(&engine, july_id).await, 0);
    assert_eq!(budget_spent(&engine, august_id).await, 120);
    assert_eq!(wallet_balance(&engine, wallet_id).await, 880);
}

#[tokio::test]
async fn list_transactions_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;

    for day in 1..=5 {
        engine
            .create_transaction(
                CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 10)
                    .occurred_at(july(day)),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (page, cursor) = engine
        .list_transactions_page("alice", 2, None, &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].occurred_at, july(5));
    assert_eq!(page[1].occurred_at, july(4));
    let cursor = cursor.unwrap();

    let (page, cursor) = engine
        .list_transactions_page("alice", 2, Some(cursor.as_str()), &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].occurred_at, july(3));
    assert_eq!(page[1].occurred_at, july(2));
    let cursor = cursor.unwrap();

    let (page, cursor) = engine
        .list_transactions_page("alice", 2, Some(cursor.as_str()), &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].occurred_at, july(1));
    assert!(cursor.is_none());

    let err = engine
        .list_transactions_page("alice", 2, Some("not-a-cursor"), &filter)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidCursor("invalid transactions cursor".to_string())
    );
}

#[tokio::test]
async fn list_transactions_applies_range_kind_and_target_filters() {
    let (engine, _db) = engine_with_db().await;
    let (cash_id, food_id) = cash_and_food(&engine, 1000).await;
    let bank_id = engine
        .create_wallet("alice", "Bank", 500, None, false)
        .await
        .unwrap()
        .id;
    let fuel_id = engine
        .create_category("alice", "Fuel", None)
        .await
        .unwrap()
        .id;

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", cash_id, food_id, TransactionKind::Expense, 20)
                .occurred_at(july(5)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", bank_id, fuel_id, TransactionKind::Expense, 30)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", cash_id, food_id, TransactionKind::Income, 40)
                .occurred_at(july(15)),
        )
        .await
        .unwrap();

    // The range is half-open: `from` is kept, `to` is not.
    let ranged = TransactionListFilter {
        from: Some(july(5)),
        to: Some(july(15)),
        ..Default::default()
    };
    let txs = engine.list_transactions("alice", 10, &ranged).await.unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs.iter().all(|tx| tx.kind == TransactionKind::Expense));

    let incomes_only = TransactionListFilter {
        kinds: Some(vec![TransactionKind::Income]),
        ..Default::default()
    };
    let txs = engine
        .list_transactions("alice", 10, &incomes_only)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount_minor, 40);

    let bank_only = TransactionListFilter {
        wallet_id: Some(bank_id),
        ..Default::default()
    };
    let txs = engine
        .list_transactions("alice", 10, &bank_only)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].category_id, fuel_id);

    let inverted = TransactionListFilter {
        from: Some(july(15)),
        to: Some(july(5)),
        ..Default::default()
    };
    let err = engine
        .list_transactions("alice", 10, &inverted)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("invalid range: from must be < to".to_string())
    );

    let no_kinds = TransactionListFilter {
        kinds: Some(Vec::new()),
        ..Default::default()
    };
    let err = engine
        .list_transactions("alice", 10, &no_kinds)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("kinds must not be empty".to_string())
    );
}

#[tokio::test]
async fn cross_user_state_is_invisible() {
    let (engine, _db) = engine_with_db().await;
    let (alice_wallet, alice_food) = cash_and_food(&engine, 1000).await;
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                alice_wallet,
                alice_food,
                TransactionKind::Expense,
                120,
            )
            .occurred_at(july(10)),
        )
        .await
        .unwrap();

    let bob_food = engine
        .create_category("bob", "Food", None)
        .await
        .unwrap()
        .id;

    let err = engine
        .create_transaction(CreateTransactionCmd::new(
            "bob",
            alice_wallet,
            bob_food,
            TransactionKind::Expense,
            10,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("wallet not exists".to_string())
    );

    let err = engine.transaction("bob", tx.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("transaction not exists".to_string())
    );
    let err = engine.delete_transaction("bob", tx.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("transaction not exists".to_string())
    );

    let txs = engine
        .list_transactions("bob", 10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
    assert_eq!(wallet_balance(&engine, alice_wallet).await, 880);
}

#[tokio::test]
async fn recompute_derived_rebuilds_balances_and_spent_from_the_ledger() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();
    let (cash_id, food_id) = cash_and_food(&engine, 1000).await;
    let bank_id = engine
        .create_wallet("alice", "Bank", 500, None, false)
        .await
        .unwrap()
        .id;
    let budget_id = july_budget(&engine, food_id, 300, 300).await;

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", cash_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", cash_id, food_id, TransactionKind::Income, 50)
                .occurred_at(july(12)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", cash_id, food_id, TransactionKind::Expense, 30)
                .occurred_at(july(20)),
        )
        .await
        .unwrap();

    // Corrupt the denormalized columns directly in DB.
    for wallet_id in [cash_id, bank_id] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "UPDATE wallets SET balance = ? WHERE id = ?;",
            vec![999i64.into(), wallet_id.to_string().into()],
        ))
        .await
        .unwrap();
    }
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE budget_allocations SET spent_minor = ? WHERE budget_id = ?;",
        vec![999i64.into(), budget_id.to_string().into()],
    ))
    .await
    .unwrap();

    engine.recompute_derived("alice").await.unwrap();

    // Opening amounts seed the replay: Cash restarts from 1000, Bank from 500.
    assert_eq!(wallet_balance(&engine, cash_id).await, 900);
    assert_eq!(wallet_balance(&engine, bank_id).await, 500);
    assert_eq!(budget_spent(&engine, budget_id).await, 150);

    // Verify DB matches recompute results too.
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT balance FROM wallets WHERE id = ?;",
            vec![cash_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    let db_balance: i64 = row.try_get("", "balance").unwrap();
    assert_eq!(db_balance, 900);
}

#[tokio::test]
async fn restart_engine_reads_same_state() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let (wallet_id, food_id) = cash_and_food(&engine, 1000).await;

    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", wallet_id, food_id, TransactionKind::Expense, 120)
                .occurred_at(july(10)),
        )
        .await
        .unwrap();

    drop(engine);
    drop(db);

    let db2 = Database::connect(&url).await.unwrap();
    let engine2 = Engine::builder()
        .database(db2.clone())
        .build()
        .await
        .unwrap();

    let wallet = engine2.wallet("alice", wallet_id).await.unwrap();
    assert_eq!(wallet.balance, 880);
    let txs = engine2
        .list_transactions("alice", 10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount_minor, 120);

    drop(db2);
    let _ = std::fs::remove_file(path);
}
