use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, budgets, categories, transactions, wallets};

use super::Engine;

/// Generates `find_*` and `require_*` methods for a user-owned entity.
///
/// A row that does not exist and a row owned by another user produce the same
/// `KeyNotFound`, so callers cannot probe for foreign identifiers.
macro_rules! impl_owned_by_user {
    ($find_fn:ident, $require_fn:ident, $entity:path, $model:path, $user_col:expr, $err_msg:literal) => {
        async fn $find_fn(
            &self,
            db: &DatabaseTransaction,
            user_id: &str,
            target_id: Uuid,
        ) -> ResultEngine<Option<$model>> {
            <$entity>::find_by_id(target_id.to_string())
                .filter($user_col.eq(user_id.to_string()))
                .one(db)
                .await
                .map_err(Into::into)
        }

        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            user_id: &str,
            target_id: Uuid,
        ) -> ResultEngine<$model> {
            self.$find_fn(db, user_id, target_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_owned_by_user!(
        find_wallet_for_user,
        require_wallet,
        wallets::Entity,
        wallets::Model,
        wallets::Column::UserId,
        "wallet not exists"
    );

    impl_owned_by_user!(
        find_category_for_user,
        require_category,
        categories::Entity,
        categories::Model,
        categories::Column::UserId,
        "category not exists"
    );

    impl_owned_by_user!(
        find_budget_for_user,
        require_budget,
        budgets::Entity,
        budgets::Model,
        budgets::Column::UserId,
        "budget not exists"
    );

    impl_owned_by_user!(
        find_transaction_for_user,
        require_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Column::UserId,
        "transaction not exists"
    );
}
