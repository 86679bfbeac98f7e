use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    CreateTransactionCmd, EngineError, ResultEngine, Transaction, TransactionKind, transactions,
};

use super::common::Previews;
use super::super::super::{Engine, ensure_user_id, normalize_optional_text, with_tx};

impl Engine {
    /// Records a new transaction and keeps the derived state in step.
    ///
    /// An expense is admission-checked before anything is written: the wallet
    /// floor is zero, and a transaction that would cross it is rejected with
    /// `InsufficientFunds`. An expense also adds to the `spent_minor` of every
    /// allocation covering its category at `occurred_at`. An income only moves
    /// the wallet balance.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let user_id = cmd.user_id;
        let wallet_id = cmd.wallet_id;
        let category_id = cmd.category_id;
        let kind = cmd.kind;
        let amount_minor = cmd.amount_minor;
        let note = normalize_optional_text(cmd.note.as_deref());
        let occurred_at = cmd.occurred_at;
        ensure_user_id(&user_id)?;
        with_tx!(self, |db_tx| {
            let tx = Transaction::new(
                user_id.clone(),
                wallet_id,
                category_id,
                kind,
                amount_minor,
                note,
                occurred_at,
            )?;

            self.require_category(&db_tx, &user_id, category_id).await?;
            let wallet_model = self.require_wallet(&db_tx, &user_id, wallet_id).await?;
            if kind == TransactionKind::Expense && wallet_model.balance < amount_minor {
                return Err(EngineError::InsufficientFunds(format!(
                    "wallet '{}'",
                    wallet_model.title
                )));
            }

            let mut previews = Previews::default();
            self.preview_wallet_delta(
                &db_tx,
                &user_id,
                &mut previews.wallets,
                wallet_id,
                kind.signed_amount(amount_minor),
            )
            .await?;
            if kind == TransactionKind::Expense {
                self.preview_spent_delta(
                    &db_tx,
                    &user_id,
                    &mut previews.spent,
                    category_id,
                    occurred_at,
                    amount_minor,
                )
                .await?;
            }

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.persist_previews(&db_tx, &previews).await?;

            Ok(tx)
        })
    }
}
