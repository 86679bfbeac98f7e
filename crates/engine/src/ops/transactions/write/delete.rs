use uuid::Uuid;

use sea_orm::{TransactionTrait, prelude::*};

use crate::{ResultEngine, Transaction, TransactionKind, transactions};

use super::common::Previews;
use super::super::super::{Engine, ensure_user_id, with_tx};

impl Engine {
    /// Deletes a transaction and reverses its effects.
    ///
    /// The wallet gets the signed amount back and, for an expense, every
    /// allocation that covered the category at `occurred_at` gives back its
    /// share of `spent_minor`. Reversals are not admission-checked, so undoing
    /// an income may leave the wallet balance below zero.
    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let tx_model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let old = Transaction::try_from(tx_model)?;

            let mut previews = Previews::default();
            self.preview_wallet_delta(
                &db_tx,
                user_id,
                &mut previews.wallets,
                old.wallet_id,
                -old.kind.signed_amount(old.amount_minor),
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

            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;
            self.persist_previews(&db_tx, &previews).await?;

            Ok(())
        })
    }
}
