//! Budget primitives.
//!
//! A `Budget` is a spending envelope: a total amount, a date window and an
//! ordered list of per-category allocations. The engine keeps each
//! allocation's `spent_minor` in sync with the expense transactions that fall
//! inside the window; totals and remaining amounts are always derived, never
//! stored.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, budget_allocations::BudgetAllocation};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub total_minor: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub allocations: Vec<BudgetAllocation>,
}

impl Budget {
    #[must_use]
    pub fn new(
        user_id: String,
        name: String,
        total_minor: i64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            total_minor,
            start_date,
            end_date,
            is_active: true,
            created_at: Utc::now(),
            allocations: Vec::new(),
        }
    }

    /// Sum of spending tracked across all allocations.
    #[must_use]
    pub fn total_spent_minor(&self) -> i64 {
        self.allocations.iter().map(|a| a.spent_minor).sum()
    }

    /// Amount left before the whole envelope is exhausted.
    ///
    /// Spending is never clamped, so the value goes negative once the window
    /// is overspent.
    #[must_use]
    pub fn remaining_minor(&self) -> i64 {
        self.total_minor - self.total_spent_minor()
    }

    /// Whether an expense in `category_id` at `at` belongs to this budget.
    ///
    /// Requires the budget to be active, the instant to fall inside the date
    /// window (both ends inclusive) and an allocation for the category.
    #[must_use]
    pub fn covers(&self, category_id: Uuid, at: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date <= at
            && at <= self.end_date
            && self
                .allocations
                .iter()
                .any(|a| a.category_id == category_id)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub total_minor: i64,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_allocations::Entity")]
    BudgetAllocations,
}

impl Related<super::budget_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            total_minor: ActiveValue::Set(value.total_minor),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            is_active: ActiveValue::Set(value.is_active),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<(Model, Vec<super::budget_allocations::Model>)> for Budget {
    type Error = EngineError;

    fn try_from(
        (model, allocation_models): (Model, Vec<super::budget_allocations::Model>),
    ) -> Result<Self, Self::Error> {
        let mut allocations = Vec::with_capacity(allocation_models.len());
        for allocation_model in allocation_models {
            allocations.push(BudgetAllocation::try_from(allocation_model)?);
        }
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("budget not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            total_minor: model.total_minor,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            created_at: model.created_at,
            allocations,
        })
    }
}
