use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, UpdateTransactionCmd, transactions,
};

use super::common::{Previews, apply_optional_text_patch};
use super::super::super::{Engine, ensure_user_id, with_tx};

impl Engine {
    /// Updates a transaction (amount, kind, targets, and/or metadata).
    ///
    /// The stored row is rewritten as if the new values had been recorded in
    /// the first place: the old effects are reversed and the new ones applied
    /// in one unit, on both the wallet balances and the covering allocations.
    ///
    /// The zero floor is enforced against the post-reversal balance when the
    /// result is an expense on the same wallet. A retarget to another wallet
    /// is applied as recorded, so the new wallet may end up below zero.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        let user_id = cmd.user_id;
        let user_id = user_id.as_str();
        let transaction_id = cmd.transaction_id;
        let amount_minor = cmd.amount_minor;
        let kind = cmd.kind;
        let wallet_id = cmd.wallet_id;
        let category_id = cmd.category_id;
        let note = cmd.note.as_deref();
        let occurred_at = cmd.occurred_at;
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let tx_model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let old = Transaction::try_from(tx_model)?;

            let new_amount_minor = amount_minor.unwrap_or(old.amount_minor);
            if new_amount_minor <= 0 {
                return Err(EngineError::InvalidAmount(
                    "amount_minor must be > 0".to_string(),
                ));
            }
            let new_kind = kind.unwrap_or(old.kind);
            let new_wallet_id = wallet_id.unwrap_or(old.wallet_id);
            let new_category_id = category_id.unwrap_or(old.category_id);
            let new_occurred_at = occurred_at.unwrap_or(old.occurred_at);
            let new_note = apply_optional_text_patch(old.note.clone(), note);

            self.require_category(&db_tx, user_id, new_category_id)
                .await?;
            let wallet_model = self.require_wallet(&db_tx, user_id, new_wallet_id).await?;

            let mut previews = Previews::default();
            let post_reversal = self
                .preview_wallet_delta(
                    &db_tx,
                    user_id,
                    &mut previews.wallets,
                    old.wallet_id,
                    -old.kind.signed_amount(old.amount_minor),
                )
                .await?;
            if new_wallet_id == old.wallet_id
                && new_kind == TransactionKind::Expense
                && post_reversal < new_amount_minor
            {
                return Err(EngineError::InsufficientFunds(format!(
                    "wallet '{}'",
                    wallet_model.title
                )));
            }
            self.preview_wallet_delta(
                &db_tx,
                user_id,
                &mut previews.wallets,
                new_wallet_id,
                new_kind.signed_amount(new_amount_minor),
            )
            .await?;

            if old.kind == TransactionKind::Expense {
                self.preview_spent_delta(
                    &db_tx,
                    user_id,
                    &mut previews.spent,
                    old.category_id,
                    old.occurred_at,
                    -old.amount_minor,
                )
                .await?;
            }
            if new_kind == TransactionKind::Expense {
                self.preview_spent_delta(
                    &db_tx,
                    user_id,
                    &mut previews.spent,
                    new_category_id,
                    new_occurred_at,
                    new_amount_minor,
                )
                .await?;
            }

            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(transaction_id.to_string()),
                wallet_id: ActiveValue::Set(new_wallet_id.to_string()),
                category_id: ActiveValue::Set(new_category_id.to_string()),
                kind: ActiveValue::Set(new_kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(new_amount_minor),
                note: ActiveValue::Set(new_note),
                occurred_at: ActiveValue::Set(new_occurred_at),
                ..Default::default()
            };
            let updated = tx_active.update(&db_tx).await?;
            self.persist_previews(&db_tx, &previews).await?;

            Transaction::try_from(updated)
        })
    }
}
