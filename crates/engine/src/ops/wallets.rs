use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Wallet, transactions, wallets};

use super::{Engine, ensure_user_id, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, user_id, wallet_id).await?;
            let wallet = Wallet::try_from(model)?;
            Ok(wallet)
        })
    }

    /// Return every wallet of a user, ordered by title.
    pub async fn wallets(&self, user_id: &str) -> ResultEngine<Vec<Wallet>> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let models: Vec<wallets::Model> = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(wallets::Column::Title)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Wallet::try_from(model)?);
            }
            Ok(out)
        })
    }

    /// Add a new wallet for a user.
    ///
    /// Titles are unique per user with an exact match: "Cash" and "cash" can
    /// coexist. The opening balance is stored as given and does not create a
    /// transaction; `recompute_derived` replays the ledger on top of it.
    pub async fn create_wallet(
        &self,
        user_id: &str,
        title: &str,
        balance: i64,
        description: Option<&str>,
        is_default: bool,
    ) -> ResultEngine<Wallet> {
        ensure_user_id(user_id)?;
        let title = normalize_required_name(title, "wallet")?;
        let description = normalize_optional_text(description);
        with_tx!(self, |db_tx| {
            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .filter(wallets::Column::Title.eq(title.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(title));
            }

            let wallet = Wallet::new(
                user_id.to_string(),
                title,
                balance,
                description,
                is_default,
            );
            let wallet_model: wallets::ActiveModel = (&wallet).into();
            wallet_model.insert(&db_tx).await?;

            Ok(wallet)
        })
    }

    /// Patches wallet fields; unset arguments keep their stored value.
    ///
    /// `balance` is not part of this surface: it only moves through
    /// transaction writes, `apply_wallet_delta` and `recompute_derived`.
    pub async fn update_wallet(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        is_default: Option<bool>,
    ) -> ResultEngine<Wallet> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, user_id, wallet_id).await?;

            let new_title = match title {
                Some(raw) => {
                    let candidate = normalize_required_name(raw, "wallet")?;
                    let exists = wallets::Entity::find()
                        .filter(wallets::Column::UserId.eq(user_id.to_string()))
                        .filter(wallets::Column::Title.eq(candidate.clone()))
                        .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                        .one(&db_tx)
                        .await?
                        .is_some();
                    if exists {
                        return Err(EngineError::ExistingKey(candidate));
                    }
                    candidate
                }
                None => model.title,
            };
            let new_description = match description {
                Some(raw) => normalize_optional_text(Some(raw)),
                None => model.description,
            };
            let new_default = is_default.unwrap_or(model.is_default);

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                title: ActiveValue::Set(new_title),
                description: ActiveValue::Set(new_description),
                is_default: ActiveValue::Set(new_default),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            let wallet = Wallet::try_from(updated)?;
            Ok(wallet)
        })
    }

    /// Deletes a wallet that no transaction references.
    ///
    /// A wallet with history cannot go away, otherwise the ledger would stop
    /// being replayable; delete the transactions first.
    pub async fn delete_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<()> {
        ensure_user_id(user_id)?;
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, user_id, wallet_id).await?;

            let referenced = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if referenced {
                return Err(EngineError::InUse(model.title));
            }

            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
