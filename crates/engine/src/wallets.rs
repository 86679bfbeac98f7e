//! The module contains `Wallet` struct and its implementation.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. Its `balance` is derived state: the engine
/// adjusts it as transactions are created, updated and deleted, and callers
/// never write it directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    ///
    /// This is a UUID generated once and persisted in the database, so the
    /// wallet can be renamed without breaking references.
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub balance: i64,
    /// Balance the wallet started with, fixed at creation.
    ///
    /// No transaction backs the opening amount, so ledger replay starts from
    /// here instead of zero.
    pub opening_minor: i64,
    pub description: Option<String>,
    pub is_default: bool,
}

impl Wallet {
    #[must_use]
    pub fn new(
        user_id: String,
        title: String,
        balance: i64,
        description: Option<String>,
        is_default: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            balance,
            opening_minor: balance,
            description,
            is_default,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub balance: i64,
    pub opening_minor: i64,
    pub description: Option<String>,
    pub is_default: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            title: ActiveValue::Set(value.title.clone()),
            balance: ActiveValue::Set(value.balance),
            opening_minor: ActiveValue::Set(value.opening_minor),
            description: ActiveValue::Set(value.description.clone()),
            is_default: ActiveValue::Set(value.is_default),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            user_id: model.user_id,
            title: model.title,
            balance: model.balance,
            opening_minor: model.opening_minor,
            description: model.description,
            is_default: model.is_default,
        })
    }
}
