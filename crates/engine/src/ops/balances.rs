use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, budget_allocations, budgets,
    transactions, wallets,
};

use super::{Engine, ensure_user_id, with_tx};

impl Engine {
    /// Applies a raw signed delta to a wallet balance and returns the new
    /// balance.
    ///
    /// A negative delta is admission-checked like a new expense: it is
    /// rejected with `InsufficientFunds` when it would push the balance below
    /// zero. Positive deltas always pass.
    pub async fn apply_wallet_delta(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<i64> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let wallet_model = self.require_wallet(&db_tx, user_id, wallet_id).await?;
            let new_balance = wallet_model.balance + delta_minor;
            if delta_minor < 0 && new_balance < 0 {
                return Err(EngineError::InsufficientFunds(format!(
                    "wallet '{}'",
                    wallet_model.title
                )));
            }

            let update = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(new_balance),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(new_balance)
        })
    }

    /// Stages a balance change without touching the database.
    ///
    /// The first touch of a wallet seeds its preview from the stored balance;
    /// later touches accumulate, so several changes to the same wallet inside
    /// one mutation net into a single value. Returns the running preview.
    pub(super) async fn preview_wallet_delta(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        previews: &mut HashMap<Uuid, i64>,
        wallet_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<i64> {
        let wallet_model = self.require_wallet(db, user_id, wallet_id).await?;
        let entry = previews.entry(wallet_id).or_insert(wallet_model.balance);
        *entry += delta_minor;
        Ok(*entry)
    }

    /// Persists previewed wallet balances with one partial update per wallet.
    pub(super) async fn persist_wallet_balances(
        &self,
        db: &DatabaseTransaction,
        previews: &HashMap<Uuid, i64>,
    ) -> ResultEngine<()> {
        for (wallet_id, new_balance) in previews {
            let update = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(*new_balance),
                ..Default::default()
            };
            update.update(db).await?;
        }
        Ok(())
    }

    /// Recomputes denormalized state for one user from the ledger.
    ///
    /// Wallet balances start from each wallet's opening amount and replay the
    /// stored transactions in chronological order; allocation spending is
    /// rebuilt the same way. Whatever the derived columns held before is
    /// discarded. Inactive budgets keep their historical spending, so the
    /// replay matches windows and categories without looking at `is_active`.
    pub async fn recompute_derived(&self, user_id: &str) -> ResultEngine<()> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let wallet_models: Vec<wallets::Model> = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut balances: HashMap<Uuid, i64> = HashMap::new();
            for model in wallet_models {
                let wallet_id = Uuid::parse_str(&model.id)
                    .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?;
                // The opening amount has no ledger row; replay starts from it.
                balances.insert(wallet_id, model.opening_minor);
            }

            let budget_models: Vec<budgets::Model> = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut windows_by_budget: HashMap<String, (DateTime<Utc>, DateTime<Utc>)> =
                HashMap::new();
            for model in budget_models {
                windows_by_budget.insert(model.id, (model.start_date, model.end_date));
            }

            let allocation_models: Vec<budget_allocations::Model> =
                budget_allocations::Entity::find()
                    .join(
                        JoinType::InnerJoin,
                        budget_allocations::Relation::Budgets.def(),
                    )
                    .filter(budgets::Column::UserId.eq(user_id.to_string()))
                    .all(&db_tx)
                    .await?;

            // (window, category, allocation) triples to match expenses against.
            let mut slots: Vec<(DateTime<Utc>, DateTime<Utc>, Uuid, Uuid)> = Vec::new();
            let mut spent: HashMap<Uuid, i64> = HashMap::new();
            for model in allocation_models {
                let Some((start_date, end_date)) = windows_by_budget.get(&model.budget_id) else {
                    return Err(EngineError::KeyNotFound("budget not exists".to_string()));
                };
                let allocation_id = Uuid::parse_str(&model.id)
                    .map_err(|_| EngineError::KeyNotFound("allocation not exists".to_string()))?;
                let category_id = Uuid::parse_str(&model.category_id)
                    .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?;
                slots.push((*start_date, *end_date, category_id, allocation_id));
                spent.insert(allocation_id, 0);
            }

            // Replay the ledger in chronological order.
            let tx_models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(transactions::Column::OccurredAt)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?;

            for model in tx_models {
                let tx = Transaction::try_from(model)?;
                let balance = balances
                    .get_mut(&tx.wallet_id)
                    .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
                *balance += tx.kind.signed_amount(tx.amount_minor);

                if tx.kind == TransactionKind::Expense {
                    for (start_date, end_date, category_id, allocation_id) in &slots {
                        if *category_id == tx.category_id
                            && *start_date <= tx.occurred_at
                            && tx.occurred_at <= *end_date
                        {
                            if let Some(value) = spent.get_mut(allocation_id) {
                                *value += tx.amount_minor;
                            }
                        }
                    }
                }
            }

            self.persist_wallet_balances(&db_tx, &balances).await?;
            for (allocation_id, spent_minor) in &spent {
                let update = budget_allocations::ActiveModel {
                    id: ActiveValue::Set(allocation_id.to_string()),
                    spent_minor: ActiveValue::Set(*spent_minor),
                    ..Default::default()
                };
                update.update(&db_tx).await?;
            }

            Ok(())
        })
    }
}
