//! Per-category allocation rows inside a budget.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A slice of a budget reserved for one category.
///
/// `spent_minor` is owned by the engine: it accumulates the expense
/// transactions the parent budget covers and is never set by callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub limit_minor: i64,
    pub spent_minor: i64,
    pub position: i32,
}

impl BudgetAllocation {
    #[must_use]
    pub fn new(budget_id: Uuid, category_id: Uuid, limit_minor: i64, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            category_id,
            limit_minor,
            spent_minor: 0,
            position,
        }
    }

    /// Amount left under this allocation's limit; negative when overspent.
    #[must_use]
    pub fn remaining_minor(&self) -> i64 {
        self.limit_minor - self.spent_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub budget_id: String,
    pub category_id: String,
    pub limit_minor: i64,
    pub spent_minor: i64,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Budgets,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BudgetAllocation> for ActiveModel {
    fn from(value: &BudgetAllocation) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            budget_id: ActiveValue::Set(value.budget_id.to_string()),
            category_id: ActiveValue::Set(value.category_id.to_string()),
            limit_minor: ActiveValue::Set(value.limit_minor),
            spent_minor: ActiveValue::Set(value.spent_minor),
            position: ActiveValue::Set(value.position),
        }
    }
}

impl TryFrom<Model> for BudgetAllocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("allocation not exists".to_string()))?,
            budget_id: Uuid::parse_str(&model.budget_id)
                .map_err(|_| EngineError::KeyNotFound("budget not exists".to_string()))?,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            limit_minor: model.limit_minor,
            spent_minor: model.spent_minor,
            position: model.position,
        })
    }
}
