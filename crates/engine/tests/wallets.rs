use sea_orm::{Database, DatabaseConnection};

use engine::{CreateTransactionCmd, Engine, EngineError, TransactionKind};
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

#[tokio::test]
async fn wallet_titles_are_trimmed_and_unique_per_user() {
    let (engine, _db) = engine_with_db().await;

    let wallet = engine
        .create_wallet("alice", "  Cash  ", 0, None, true)
        .await
        .unwrap();
    assert_eq!(wallet.title, "Cash");

    let err = engine
        .create_wallet("alice", "Cash", 0, None, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Cash".to_string()));

    // Another user is free to reuse the title.
    engine
        .create_wallet("bob", "Cash", 0, None, true)
        .await
        .unwrap();

    let bank = engine
        .create_wallet("alice", "Bank", 0, None, false)
        .await
        .unwrap();
    let err = engine
        .update_wallet("alice", bank.id, Some("Cash"), None, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Cash".to_string()));

    let renamed = engine
        .update_wallet("alice", bank.id, Some("Bank"), None, None)
        .await
        .unwrap();
    assert_eq!(renamed.title, "Bank");

    let err = engine
        .create_wallet("alice", "   ", 0, None, false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("wallet name must not be empty".to_string())
    );
}

#[tokio::test]
async fn update_wallet_patches_fields_but_not_balance() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine
        .create_wallet("alice", "Cash", 500, Some("pocket money"), false)
        .await
        .unwrap();

    let updated = engine
        .update_wallet("alice", wallet.id, Some("Everyday"), Some(""), Some(true))
        .await
        .unwrap();
    assert_eq!(updated.title, "Everyday");
    assert_eq!(updated.description, None);
    assert!(updated.is_default);
    assert_eq!(updated.balance, 500);
    assert_eq!(updated.opening_minor, 500);

    // Unset arguments keep their stored value.
    let untouched = engine
        .update_wallet("alice", wallet.id, None, None, None)
        .await
        .unwrap();
    assert_eq!(untouched.title, "Everyday");
    assert_eq!(untouched.balance, 500);
}

#[tokio::test]
async fn delete_wallet_blocked_while_transactions_reference_it() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine
        .create_wallet("alice", "Cash", 1000, None, true)
        .await
        .unwrap();
    let food = engine.create_category("alice", "Food", None).await.unwrap();
    let tx = engine
        .create_transaction(CreateTransactionCmd::new(
            "alice",
            wallet.id,
            food.id,
            TransactionKind::Expense,
            120,
        ))
        .await
        .unwrap();

    let err = engine.delete_wallet("alice", wallet.id).await.unwrap_err();
    assert_eq!(err, EngineError::InUse("Cash".to_string()));

    engine.delete_transaction("alice", tx.id).await.unwrap();
    engine.delete_wallet("alice", wallet.id).await.unwrap();

    let err = engine.wallet("alice", wallet.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));
}

#[tokio::test]
async fn apply_wallet_delta_floors_negative_deltas_at_zero() {
    let (engine, _db) = engine_with_db().await;
    let wallet = engine
        .create_wallet("alice", "Cash", 100, None, true)
        .await
        .unwrap();

    let err = engine
        .apply_wallet_delta("alice", wallet.id, -150)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds("wallet 'Cash'".to_string())
    );

    let balance = engine
        .apply_wallet_delta("alice", wallet.id, 50)
        .await
        .unwrap();
    assert_eq!(balance, 150);

    // Draining to exactly zero is allowed.
    let balance = engine
        .apply_wallet_delta("alice", wallet.id, -150)
        .await
        .unwrap();
    assert_eq!(balance, 0);
    assert_eq!(engine.wallet("alice", wallet.id).await.unwrap().balance, 0);
}

#[tokio::test]
async fn wallets_list_is_ordered_and_scoped_to_owner() {
    let (engine, _db) = engine_with_db().await;
    for title in ["Savings", "Bank", "Cash"] {
        engine
            .create_wallet("alice", title, 0, None, false)
            .await
            .unwrap();
    }

    let wallets = engine.wallets("alice").await.unwrap();
    let titles: Vec<&str> = wallets.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(titles, ["Bank", "Cash", "Savings"]);

    assert!(engine.wallets("bob").await.unwrap().is_empty());
    let err = engine.wallet("bob", wallets[0].id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));
}

#[tokio::test]
async fn blank_user_id_is_unauthorized() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_wallet("", "Cash", 0, None, false)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized("missing user id".to_string()));

    let err = engine.wallets("   ").await.unwrap_err();
    assert_eq!(err, EngineError::Unauthorized("missing user id".to_string()));
}
